//! Component checks: state of the platform's own installed components.

use anyhow::Result;
use async_trait::async_trait;

use crate::engine::check::{PlatformCheck, Target};
use crate::engine::types::{Condition, ConditionStatus, DiagnosticResult, Group, Impact};

const PLATFORM_NAMESPACE: &str = "platform";

/// `components.model-registry.disabled`: the legacy model registry was
/// removed in 3.0 and must be disabled before crossing the 2.x -> 3.x
/// boundary.
pub struct ModelRegistryDisabledCheck;

#[async_trait]
impl PlatformCheck for ModelRegistryDisabledCheck {
    fn id(&self) -> &str {
        "components.model-registry.disabled"
    }

    fn name(&self) -> &str {
        "model-registry-disabled"
    }

    fn description(&self) -> &str {
        "the legacy model registry is disabled before a 3.x upgrade"
    }

    fn remediation(&self) -> Option<&str> {
        Some("scale the model-registry deployment to zero and migrate its contents")
    }

    fn group(&self) -> Group {
        Group::Component
    }

    async fn can_apply(&self, target: &Target) -> Result<bool> {
        Ok(target.crosses_major(3))
    }

    async fn validate(&self, target: &Target) -> Result<DiagnosticResult> {
        let deployment = target
            .cluster
            .get("Deployment", Some(PLATFORM_NAMESPACE), "model-registry")
            .await?;

        let result = DiagnosticResult::new(
            Group::Component,
            "Deployment",
            self.name(),
            self.description(),
        );
        let replicas = deployment
            .as_ref()
            .and_then(|d| d["spec"]["replicas"].as_u64())
            .unwrap_or(0);

        if replicas > 0 {
            Ok(result.with_condition(
                Condition::new(
                    "Compatible",
                    ConditionStatus::False,
                    "ComponentEnabled",
                    format!("model registry is running with {replicas} replica(s); it was removed in 3.0"),
                    Impact::Blocking,
                )
                .with_remediation(self.remediation().unwrap_or_default()),
            ))
        } else {
            Ok(result.with_condition(Condition::passed(
                "Compatible",
                "ComponentDisabled",
                "model registry is disabled",
            )))
        }
    }
}

/// `components.operator.ready`: the platform operator must be healthy to
/// orchestrate the upgrade.
pub struct OperatorReadyCheck;

#[async_trait]
impl PlatformCheck for OperatorReadyCheck {
    fn id(&self) -> &str {
        "components.operator.ready"
    }

    fn name(&self) -> &str {
        "operator-ready"
    }

    fn description(&self) -> &str {
        "the platform operator is running and ready"
    }

    fn remediation(&self) -> Option<&str> {
        Some("check the platform-operator deployment logs and restore it to a ready state")
    }

    fn group(&self) -> Group {
        Group::Component
    }

    async fn can_apply(&self, _target: &Target) -> Result<bool> {
        Ok(true)
    }

    async fn validate(&self, target: &Target) -> Result<DiagnosticResult> {
        let deployment = target
            .cluster
            .get("Deployment", Some(PLATFORM_NAMESPACE), "platform-operator")
            .await?;

        let result = DiagnosticResult::new(
            Group::Component,
            "Deployment",
            self.name(),
            self.description(),
        );
        let Some(deployment) = deployment else {
            // Absence here is a finding, not an engine error: the operator
            // deployment is how the upgrade would be driven at all.
            return Ok(result.with_condition(
                Condition::new(
                    "Available",
                    ConditionStatus::False,
                    "ResourceNotFound",
                    "platform-operator deployment not found",
                    Impact::Blocking,
                )
                .with_remediation(self.remediation().unwrap_or_default()),
            ));
        };

        let desired = deployment["spec"]["replicas"].as_u64().unwrap_or(1);
        let ready = deployment["status"]["readyReplicas"].as_u64().unwrap_or(0);

        if ready >= desired && desired > 0 {
            Ok(result.with_condition(Condition::passed(
                "Available",
                "OperatorReady",
                format!("{ready}/{desired} operator replicas ready"),
            )))
        } else {
            Ok(result.with_condition(
                Condition::new(
                    "Available",
                    ConditionStatus::False,
                    "OperatorNotReady",
                    format!("{ready}/{desired} operator replicas ready"),
                    Impact::Blocking,
                )
                .with_remediation(self.remediation().unwrap_or_default()),
            ))
        }
    }
}
