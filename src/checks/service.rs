//! Service checks: platform-adjacent services that must be configured for
//! the target release.

use anyhow::Result;
use async_trait::async_trait;

use crate::engine::check::{PlatformCheck, Target};
use crate::engine::types::{Condition, ConditionStatus, DiagnosticResult, Group, Impact};

const PLATFORM_NAMESPACE: &str = "platform";
const MONITORING_NAMESPACE: &str = "platform-monitoring";

/// `services.monitoring.metrics-service`: releases from 3.0 ship dashboards
/// that read from the in-cluster metrics service.
pub struct MetricsServiceCheck;

#[async_trait]
impl PlatformCheck for MetricsServiceCheck {
    fn id(&self) -> &str {
        "services.monitoring.metrics-service"
    }

    fn name(&self) -> &str {
        "metrics-service"
    }

    fn description(&self) -> &str {
        "the monitoring metrics service exists"
    }

    fn remediation(&self) -> Option<&str> {
        Some("install the platform monitoring stack before upgrading")
    }

    fn group(&self) -> Group {
        Group::Service
    }

    async fn can_apply(&self, target: &Target) -> Result<bool> {
        // Only meaningful when upgrading into the 3.x dashboards.
        Ok(target.target_at_least(3, 0))
    }

    async fn validate(&self, target: &Target) -> Result<DiagnosticResult> {
        let service = target
            .cluster
            .get("Service", Some(MONITORING_NAMESPACE), "metrics")
            .await?;

        let result =
            DiagnosticResult::new(Group::Service, "Service", self.name(), self.description());
        match service {
            Some(_) => Ok(result.with_condition(Condition::passed(
                "Configured",
                "Found",
                "metrics service is present",
            ))),
            None => Ok(result.with_condition(
                Condition::new(
                    "Configured",
                    ConditionStatus::False,
                    "ResourceNotFound",
                    "metrics service not found; 3.x dashboards will be empty",
                    Impact::Advisory,
                )
                .with_remediation(self.remediation().unwrap_or_default()),
            )),
        }
    }
}

/// `services.registry.pull-secret`: the image pull secret for the platform
/// registry must exist or the upgraded pods cannot start.
pub struct RegistryPullSecretCheck;

#[async_trait]
impl PlatformCheck for RegistryPullSecretCheck {
    fn id(&self) -> &str {
        "services.registry.pull-secret"
    }

    fn name(&self) -> &str {
        "registry-pull-secret"
    }

    fn description(&self) -> &str {
        "registry credentials are present in the platform namespace"
    }

    fn remediation(&self) -> Option<&str> {
        Some("recreate the 'registry-credentials' secret in the platform namespace")
    }

    fn group(&self) -> Group {
        Group::Service
    }

    async fn can_apply(&self, _target: &Target) -> Result<bool> {
        Ok(true)
    }

    async fn validate(&self, target: &Target) -> Result<DiagnosticResult> {
        let secret = target
            .cluster
            .get("Secret", Some(PLATFORM_NAMESPACE), "registry-credentials")
            .await?;

        let result =
            DiagnosticResult::new(Group::Service, "Secret", self.name(), self.description());
        match secret {
            Some(_) => Ok(result.with_condition(Condition::passed(
                "Configured",
                "Found",
                "registry pull secret is present",
            ))),
            None => Ok(result.with_condition(
                Condition::new(
                    "Configured",
                    ConditionStatus::False,
                    "ResourceNotFound",
                    "registry pull secret is missing; upgraded pods cannot pull images",
                    Impact::Blocking,
                )
                .with_remediation(self.remediation().unwrap_or_default()),
            )),
        }
    }
}
