//! Workload checks: user workloads that the upgrade will touch.

use anyhow::Result;
use async_trait::async_trait;

use crate::engine::check::{ObjectFormatter, PlatformCheck, Target};
use crate::engine::types::{
    Condition, ConditionStatus, DiagnosticResult, Group, Impact, ObjectRef,
};

/// `workloads.ray.impacted-workloads`: Ray clusters created against the 1.x
/// Ray API stop scheduling after a 3.x platform upgrade.
pub struct RayImpactedWorkloadsCheck;

struct RayObjectFormatter;

impl ObjectFormatter for RayObjectFormatter {
    fn format_object(&self, object: &ObjectRef) -> String {
        let ray_version = object
            .annotations
            .get("rayVersion")
            .map(String::as_str)
            .unwrap_or("unknown");
        match &object.namespace {
            Some(ns) => format!("RayCluster {ns}/{} (ray {ray_version})", object.name),
            None => format!("RayCluster {} (ray {ray_version})", object.name),
        }
    }
}

static RAY_FORMATTER: RayObjectFormatter = RayObjectFormatter;

#[async_trait]
impl PlatformCheck for RayImpactedWorkloadsCheck {
    fn id(&self) -> &str {
        "workloads.ray.impacted-workloads"
    }

    fn name(&self) -> &str {
        "ray-impacted-workloads"
    }

    fn description(&self) -> &str {
        "Ray clusters on the deprecated 1.x API will stop scheduling after the upgrade"
    }

    fn remediation(&self) -> Option<&str> {
        Some("recreate the listed Ray clusters against the Ray 2.x API")
    }

    fn group(&self) -> Group {
        Group::Workload
    }

    async fn can_apply(&self, target: &Target) -> Result<bool> {
        // The Ray API break ships with 3.0.
        Ok(target.target_at_least(3, 0))
    }

    async fn validate(&self, target: &Target) -> Result<DiagnosticResult> {
        let clusters = target.cluster.list("RayCluster", None).await?;

        let mut result = DiagnosticResult::new(
            Group::Workload,
            "RayCluster",
            self.name(),
            self.description(),
        );

        let mut impacted = 0usize;
        for cluster in &clusters {
            let ray_version = cluster["spec"]["rayVersion"].as_str().unwrap_or("");
            if !ray_version.starts_with("1.") {
                continue;
            }
            impacted += 1;
            let name = cluster["metadata"]["name"].as_str().unwrap_or("<unnamed>");
            let mut object = ObjectRef::new(name).annotate("rayVersion", ray_version);
            if let Some(ns) = cluster["metadata"]["namespace"].as_str() {
                object = object.in_namespace(ns);
            }
            result = result.with_impacted_object(object);
        }

        result = result.with_annotation("rayClustersTotal", clusters.len().to_string());
        if impacted > 0 {
            Ok(result.with_condition(
                Condition::new(
                    "Compatible",
                    ConditionStatus::False,
                    "DeprecatedRayApi",
                    format!("{impacted} Ray cluster(s) use the deprecated 1.x API"),
                    Impact::Advisory,
                )
                .with_remediation(self.remediation().unwrap_or_default()),
            ))
        } else {
            Ok(result.with_condition(Condition::passed(
                "Compatible",
                "NoImpactedWorkloads",
                "no Ray clusters use the deprecated API",
            )))
        }
    }

    fn formatter(&self) -> Option<&dyn ObjectFormatter> {
        Some(&RAY_FORMATTER)
    }
}

/// `workloads.notebooks.idle-sessions`: running notebook sessions are
/// restarted by the upgrade; warn so operators can drain them first.
pub struct NotebookSessionsCheck;

#[async_trait]
impl PlatformCheck for NotebookSessionsCheck {
    fn id(&self) -> &str {
        "workloads.notebooks.idle-sessions"
    }

    fn name(&self) -> &str {
        "notebook-sessions"
    }

    fn description(&self) -> &str {
        "running notebook sessions will be interrupted by the upgrade"
    }

    fn remediation(&self) -> Option<&str> {
        Some("ask users to save their work; sessions restart during the upgrade")
    }

    fn group(&self) -> Group {
        Group::Workload
    }

    async fn can_apply(&self, _target: &Target) -> Result<bool> {
        Ok(true)
    }

    async fn validate(&self, target: &Target) -> Result<DiagnosticResult> {
        let notebooks = target.cluster.list("Notebook", None).await?;

        let mut result = DiagnosticResult::new(
            Group::Workload,
            "Notebook",
            self.name(),
            self.description(),
        );

        let mut running = 0usize;
        for notebook in &notebooks {
            if notebook["status"]["phase"].as_str() != Some("Running") {
                continue;
            }
            running += 1;
            let name = notebook["metadata"]["name"].as_str().unwrap_or("<unnamed>");
            let mut object = ObjectRef::new(name);
            if let Some(ns) = notebook["metadata"]["namespace"].as_str() {
                object = object.in_namespace(ns);
            }
            result = result.with_impacted_object(object);
        }

        if running > 0 {
            Ok(result.with_condition(
                Condition::new(
                    "Quiesced",
                    ConditionStatus::False,
                    "SessionsRunning",
                    format!("{running} notebook session(s) are running"),
                    Impact::Advisory,
                )
                .with_remediation(self.remediation().unwrap_or_default()),
            ))
        } else {
            Ok(result.with_condition(Condition::passed(
                "Quiesced",
                "NoRunningSessions",
                "no notebook sessions are running",
            )))
        }
    }
}
