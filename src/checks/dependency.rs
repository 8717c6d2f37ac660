//! Dependency checks: things the platform requires from the surrounding
//! cluster before an upgrade can proceed.

use anyhow::Result;
use async_trait::async_trait;

use crate::engine::check::{PlatformCheck, Target};
use crate::engine::types::{Condition, ConditionStatus, DiagnosticResult, Group, Impact};
use crate::version::PlatformVersion;

/// Minimum Kubernetes version by target release line.
fn minimum_kubernetes(target: &Target) -> PlatformVersion {
    if target.target_at_least(3, 0) {
        PlatformVersion::new(1, 27, 0)
    } else {
        PlatformVersion::new(1, 24, 0)
    }
}

/// `dependencies.kubernetes.server-version`: the cluster must run a
/// Kubernetes version new enough for the target release.
pub struct KubernetesVersionCheck;

#[async_trait]
impl PlatformCheck for KubernetesVersionCheck {
    fn id(&self) -> &str {
        "dependencies.kubernetes.server-version"
    }

    fn name(&self) -> &str {
        "kubernetes-server-version"
    }

    fn description(&self) -> &str {
        "Kubernetes server version meets the minimum for the target release"
    }

    fn remediation(&self) -> Option<&str> {
        Some("upgrade the Kubernetes cluster before upgrading the platform")
    }

    fn group(&self) -> Group {
        Group::Dependency
    }

    async fn can_apply(&self, _target: &Target) -> Result<bool> {
        Ok(true)
    }

    async fn validate(&self, target: &Target) -> Result<DiagnosticResult> {
        let minimum = minimum_kubernetes(target);
        let mut result = DiagnosticResult::new(
            Group::Dependency,
            "Node",
            self.name(),
            self.description(),
        );

        let nodes = target.cluster.list("Node", None).await?;
        let Some(kubelet) = nodes
            .first()
            .and_then(|node| node["status"]["nodeInfo"]["kubeletVersion"].as_str())
        else {
            return Ok(result.with_condition(Condition::new(
                "Compatible",
                ConditionStatus::Unknown,
                "NoNodesFound",
                "could not determine the Kubernetes server version",
                Impact::Advisory,
            )));
        };

        match PlatformVersion::parse(kubelet) {
            Ok(version) if version.major_minor() >= minimum.major_minor() => {
                result = result.with_annotation("kubernetesVersion", version.to_string());
                Ok(result.with_condition(Condition::passed(
                    "Compatible",
                    "VersionSupported",
                    format!("Kubernetes {version} meets the {minimum} minimum"),
                )))
            }
            Ok(version) => Ok(result.with_condition(
                Condition::new(
                    "Compatible",
                    ConditionStatus::False,
                    "VersionTooOld",
                    format!("Kubernetes {version} is below the required {minimum}"),
                    Impact::Blocking,
                )
                .with_remediation(self.remediation().unwrap_or_default()),
            )),
            Err(_) => Ok(result.with_condition(Condition::new(
                "Compatible",
                ConditionStatus::Unknown,
                "UnparseableVersion",
                format!("could not parse kubelet version '{kubelet}'"),
                Impact::Advisory,
            ))),
        }
    }
}

/// `dependencies.storage.default-class`: a default storage class must exist
/// for provisioning during the upgrade.
pub struct DefaultStorageClassCheck;

const DEFAULT_CLASS_ANNOTATION: &str = "storageclass.kubernetes.io/is-default-class";

#[async_trait]
impl PlatformCheck for DefaultStorageClassCheck {
    fn id(&self) -> &str {
        "dependencies.storage.default-class"
    }

    fn name(&self) -> &str {
        "default-storage-class"
    }

    fn description(&self) -> &str {
        "a default storage class is configured"
    }

    fn remediation(&self) -> Option<&str> {
        Some("mark one storage class as the cluster default")
    }

    fn group(&self) -> Group {
        Group::Dependency
    }

    async fn can_apply(&self, _target: &Target) -> Result<bool> {
        Ok(true)
    }

    async fn validate(&self, target: &Target) -> Result<DiagnosticResult> {
        let classes = target.cluster.list("StorageClass", None).await?;
        let default = classes.iter().find(|class| {
            class["metadata"]["annotations"][DEFAULT_CLASS_ANNOTATION].as_str() == Some("true")
        });

        let result = DiagnosticResult::new(
            Group::Dependency,
            "StorageClass",
            self.name(),
            self.description(),
        );
        match default {
            Some(class) => {
                let name = class["metadata"]["name"].as_str().unwrap_or("<unnamed>");
                Ok(result
                    .with_annotation("defaultStorageClass", name)
                    .with_condition(Condition::passed(
                        "Configured",
                        "DefaultClassFound",
                        format!("storage class '{name}' is the default"),
                    )))
            }
            None => Ok(result.with_condition(
                Condition::new(
                    "Configured",
                    ConditionStatus::False,
                    "NoDefaultClass",
                    "no storage class is marked as the cluster default",
                    Impact::Blocking,
                )
                .with_remediation(self.remediation().unwrap_or_default()),
            )),
        }
    }
}
