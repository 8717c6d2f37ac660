//! Upgrade preflight: assess a running platform installation for
//! compatibility with a target upgrade version.
//!
//! The engine executes registered diagnostic checks against live cluster
//! state in a canonical group order, aggregates their findings into a
//! deterministically ordered report, and derives a severity-driven verdict.

pub mod checks;
pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod version;

pub use cluster::{ClusterReader, StaticCluster, ThrottleConfig};
pub use config::{CliArgs, FailOn, RunConfig};
pub use engine::{
    CheckExecution, CheckRegistry, Condition, ConditionStatus, DiagnosticResult, Envelope,
    Executor, Group, Impact, ObjectRef, OutputFormat, PlatformCheck, Renderer, RunMode, RunSummary,
    SelectorSet, Target,
};
pub use error::{EXIT_ERROR, EXIT_OK, EXIT_VERDICT, PreflightError};
pub use logging::{LoggingConfig, init_logging};
pub use version::PlatformVersion;

use error::PreflightError as Error;
use std::sync::Arc;
use tracing::{info, warn};

const VERSION_NAMESPACE: &str = "platform";
const VERSION_CONFIGMAP: &str = "platform-version";

/// Outcome of a completed run: the rendered report plus what drives the
/// process exit code.
#[derive(Debug)]
pub struct RunOutcome {
    pub mode: RunMode,
    pub verdict: Impact,
    pub report: String,
}

impl RunOutcome {
    pub fn exit_code(&self, fail_on: FailOn) -> i32 {
        if fail_on.triggers(self.verdict) { EXIT_VERDICT } else { EXIT_OK }
    }
}

/// Discover the installed platform version from the cluster. Absence is not
/// an error; the run proceeds with an unknown current version.
async fn discover_current_version(
    cluster: &Arc<dyn ClusterReader>,
) -> Result<Option<PlatformVersion>, Error> {
    let configmap = cluster.get("ConfigMap", Some(VERSION_NAMESPACE), VERSION_CONFIGMAP).await?;
    let Some(raw) = configmap.as_ref().and_then(|cm| cm["data"]["version"].as_str()) else {
        warn!("installed platform version could not be discovered");
        return Ok(None);
    };
    Ok(Some(PlatformVersion::parse(raw)?))
}

/// Execute a full preflight run: resolve versions, pick the run mode, drive
/// the executor over the canonical group order under the run timeout, and
/// render the aggregated report.
///
/// Input validation has already happened in [`RunConfig::from_args`]; no
/// cluster call is made before this point.
pub async fn run_preflight(
    config: &RunConfig,
    registry: &CheckRegistry,
    cluster: Arc<dyn ClusterReader>,
) -> Result<RunOutcome, Error> {
    let current = match &config.current_version {
        Some(current) => Some(current.clone()),
        None => discover_current_version(&cluster).await?,
    };
    let target = config.target_version.clone();

    let mode = RunMode::resolve(current.as_ref(), target.as_ref())
        .ensure_not_downgrade(current.as_ref(), target.as_ref())?;

    let renderer = Renderer::new(registry, config.verbose);
    match mode {
        RunMode::NoOp => {
            info!(current = ?current.as_ref().map(ToString::to_string), "nothing to assess");
            let report = renderer.render_version_only(config.output, current.as_ref())?;
            Ok(RunOutcome { mode, verdict: Impact::None, report })
        }
        RunMode::Upgrade => {
            info!(
                current = ?current.as_ref().map(ToString::to_string),
                target = ?target.as_ref().map(ToString::to_string),
                selectors = %config.selectors.describe(),
                "starting upgrade assessment"
            );

            let run_target = Target::new(cluster)
                .with_versions(current.clone(), target.clone())
                .with_verbose(config.verbose);
            let executor = Executor::new(registry, &config.selectors);

            let (executions, failure) =
                tokio::time::timeout(config.timeout, executor.run_all(&run_target))
                    .await
                    .map_err(|_| Error::Timeout { seconds: config.timeout.as_secs() })?;
            if let Some(err) = failure {
                return Err(err);
            }

            let verdict = engine::verdict(&executions);
            let report =
                renderer.render(config.output, &executions, current.as_ref(), target.as_ref())?;
            info!(verdict = %verdict, checks = executions.len(), "assessment complete");
            Ok(RunOutcome { mode, verdict, report })
        }
        // ensure_not_downgrade already converted this state into an error.
        RunMode::RejectedDowngrade => unreachable!("downgrade rejected before execution"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;

    fn config_from(extra: &[&str]) -> RunConfig {
        let mut argv = vec!["preflight"];
        argv.extend_from_slice(extra);
        RunConfig::from_args(CliArgs::try_parse_from(argv).unwrap()).unwrap()
    }

    fn version_configmap(version: &str) -> StaticCluster {
        StaticCluster::new().with_object(
            "ConfigMap",
            Some(VERSION_NAMESPACE),
            VERSION_CONFIGMAP,
            json!({"data": {"version": version}}),
        )
    }

    #[tokio::test]
    async fn discovers_current_version_from_cluster() {
        let cluster: Arc<dyn ClusterReader> = version_configmap("2.17.0").into_shared();
        let current = discover_current_version(&cluster).await.unwrap();
        assert_eq!(current, Some(PlatformVersion::new(2, 17, 0)));
    }

    #[tokio::test]
    async fn missing_version_configmap_yields_none() {
        let cluster: Arc<dyn ClusterReader> = StaticCluster::new().into_shared();
        assert_eq!(discover_current_version(&cluster).await.unwrap(), None);
    }

    #[tokio::test]
    async fn lint_mode_runs_no_checks() {
        let config = config_from(&[]);
        let registry = checks::builtin_registry();
        let cluster = version_configmap("2.17.0").into_shared();

        let outcome = run_preflight(&config, &registry, cluster.clone()).await.unwrap();
        assert_eq!(outcome.mode, RunMode::NoOp);
        assert_eq!(outcome.verdict, Impact::None);
        assert!(outcome.report.contains("2.17.0"));
        // One read for version discovery, none for checks.
        assert_eq!(cluster.call_count(), 1);
    }

    #[tokio::test]
    async fn downgrade_is_rejected_before_any_check() {
        let config = config_from(&["--target-version", "2.17.0", "--current-version", "3.0.0"]);
        let registry = checks::builtin_registry();
        let cluster = StaticCluster::new().into_shared();

        let err = run_preflight(&config, &registry, cluster.clone()).await.unwrap_err();
        assert!(matches!(err, PreflightError::Downgrade { .. }));
        assert_eq!(cluster.call_count(), 0);
    }

    #[tokio::test]
    async fn upgrade_run_produces_report_and_verdict() {
        let config = config_from(&[
            "--target-version",
            "3.0.0",
            "--current-version",
            "2.17.0",
            "--output",
            "json",
        ]);
        let registry = checks::builtin_registry();
        // Empty cluster: missing pull secret and operator make this blocking.
        let cluster = StaticCluster::new().into_shared();

        let outcome = run_preflight(&config, &registry, cluster).await.unwrap();
        assert_eq!(outcome.mode, RunMode::Upgrade);
        assert_eq!(outcome.verdict, Impact::Blocking);
        assert_eq!(outcome.exit_code(FailOn::Blocking), EXIT_VERDICT);
    }
}
