//! End-to-end engine behavior over the built-in registry, plus ordering and
//! verdict properties.

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use clap::Parser;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

use upgrade_preflight::engine::{display_rows, sort_listing, verdict};
use upgrade_preflight::{
    checks, run_preflight, CheckExecution, CheckRegistry, CliArgs, ClusterReader, Condition,
    ConditionStatus, DiagnosticResult, Envelope, Executor, FailOn, Group, Impact, PlatformCheck,
    PreflightError, RunConfig, RunMode, SelectorSet, StaticCluster, Target, EXIT_OK, EXIT_VERDICT,
};

fn config(extra: &[&str]) -> RunConfig {
    let mut argv = vec!["preflight"];
    argv.extend_from_slice(extra);
    RunConfig::from_args(CliArgs::try_parse_from(argv).unwrap()).unwrap()
}

/// Cluster state where every built-in check passes for a 2.x -> 3.x upgrade.
fn healthy_cluster() -> StaticCluster {
    StaticCluster::new()
        .with_object(
            "Node",
            None,
            "node-a",
            json!({"status": {"nodeInfo": {"kubeletVersion": "v1.28.4"}}}),
        )
        .with_object(
            "StorageClass",
            None,
            "standard",
            json!({"metadata": {
                "name": "standard",
                "annotations": {"storageclass.kubernetes.io/is-default-class": "true"},
            }}),
        )
        .with_object("Service", Some("platform-monitoring"), "metrics", json!({}))
        .with_object("Secret", Some("platform"), "registry-credentials", json!({}))
        .with_object(
            "Deployment",
            Some("platform"),
            "platform-operator",
            json!({"spec": {"replicas": 1}, "status": {"readyReplicas": 1}}),
        )
}

fn executed_ids(executions: &[CheckExecution]) -> Vec<String> {
    executions.iter().map(|e| e.check_id.clone()).collect()
}

#[tokio::test]
async fn healthy_major_upgrade_passes_every_check() {
    let config = config(&[
        "--current-version",
        "2.17.0",
        "--target-version",
        "3.0.0",
        "--output",
        "json",
    ]);
    let registry = checks::builtin_registry();

    let outcome =
        run_preflight(&config, &registry, healthy_cluster().into_shared()).await.unwrap();
    assert_eq!(outcome.mode, RunMode::Upgrade);
    assert_eq!(outcome.verdict, Impact::None);
    assert_eq!(outcome.exit_code(FailOn::Blocking), EXIT_OK);
    assert_eq!(outcome.exit_code(FailOn::Advisory), EXIT_OK);

    let envelope: Envelope = serde_json::from_str(&outcome.report).unwrap();
    assert_eq!(envelope.summary.total, 8);
    assert_eq!(envelope.summary.passed, 8);
    assert_eq!(envelope.current_version.as_deref(), Some("2.17.0"));
    assert_eq!(envelope.target_version.as_deref(), Some("3.0.0"));
}

#[tokio::test]
async fn minor_upgrade_excludes_checks_gated_on_3x() {
    let config = config(&["--current-version", "2.17.0", "--target-version", "2.25.0"]);
    let registry = checks::builtin_registry();
    let target = Target::new(healthy_cluster().into_shared())
        .with_versions(config.current_version.clone(), config.target_version.clone());
    let executor = Executor::new(&registry, &config.selectors);

    let (executions, err) = executor.run_all(&target).await;
    assert!(err.is_none());

    let ids = executed_ids(&executions);
    assert_eq!(ids.len(), 5);
    assert!(!ids.contains(&"services.monitoring.metrics-service".to_string()));
    assert!(!ids.contains(&"components.model-registry.disabled".to_string()));
    assert!(!ids.contains(&"workloads.ray.impacted-workloads".to_string()));
}

#[tokio::test]
async fn missing_pull_secret_makes_the_run_blocking() {
    let config = config(&[
        "--current-version",
        "2.17.0",
        "--target-version",
        "3.0.0",
        "--output",
        "json",
    ]);
    let registry = checks::builtin_registry();
    // Healthy in every respect except the pull secret.
    let cluster = StaticCluster::new()
        .with_object(
            "Node",
            None,
            "node-a",
            json!({"status": {"nodeInfo": {"kubeletVersion": "v1.28.4"}}}),
        )
        .with_object(
            "StorageClass",
            None,
            "standard",
            json!({"metadata": {
                "name": "standard",
                "annotations": {"storageclass.kubernetes.io/is-default-class": "true"},
            }}),
        )
        .with_object("Service", Some("platform-monitoring"), "metrics", json!({}))
        .with_object(
            "Deployment",
            Some("platform"),
            "platform-operator",
            json!({"spec": {"replicas": 1}, "status": {"readyReplicas": 1}}),
        );

    let outcome = run_preflight(&config, &registry, cluster.into_shared()).await.unwrap();
    assert_eq!(outcome.verdict, Impact::Blocking);
    assert_eq!(outcome.exit_code(FailOn::Blocking), EXIT_VERDICT);

    let envelope: Envelope = serde_json::from_str(&outcome.report).unwrap();
    assert_eq!(envelope.summary.failed, 1);
    let failing: Vec<_> = envelope
        .results
        .iter()
        .filter(|r| r.impact == Some(Impact::Blocking))
        .map(|r| r.check.clone())
        .collect();
    assert_eq!(failing, vec!["services.registry.pull-secret"]);
}

#[tokio::test]
async fn clean_minor_upgrade_within_3x_exits_zero() {
    let config = config(&[
        "--current-version",
        "3.0.0",
        "--target-version",
        "3.1.0",
        "--output",
        "json",
    ]);
    let registry = checks::builtin_registry();

    let outcome =
        run_preflight(&config, &registry, healthy_cluster().into_shared()).await.unwrap();
    assert_eq!(outcome.verdict, Impact::None);
    assert_eq!(outcome.exit_code(FailOn::Advisory), EXIT_OK);

    // The 2.x -> 3.x boundary gate does not fire within the 3.x line.
    let envelope: Envelope = serde_json::from_str(&outcome.report).unwrap();
    assert_eq!(envelope.summary.total, 7);
    assert_eq!(envelope.summary.passed, 7);
    assert!(!envelope.results.iter().any(|r| r.check == "components.model-registry.disabled"));
}

#[tokio::test]
async fn patch_level_target_is_a_noop_run() {
    let config = config(&["--current-version", "3.0.0", "--target-version", "3.0.2"]);
    let registry = checks::builtin_registry();
    let cluster = StaticCluster::new().into_shared();

    let outcome = run_preflight(&config, &registry, cluster.clone()).await.unwrap();
    assert_eq!(outcome.mode, RunMode::NoOp);
    assert_eq!(outcome.verdict, Impact::None);
    assert_eq!(cluster.call_count(), 0);
}

#[tokio::test]
async fn downgrade_is_rejected_without_cluster_access() {
    let config = config(&["--current-version", "3.1.0", "--target-version", "2.17.0"]);
    let registry = checks::builtin_registry();
    let cluster = StaticCluster::new().into_shared();

    let err = run_preflight(&config, &registry, cluster.clone()).await.unwrap_err();
    assert!(matches!(err, PreflightError::Downgrade { .. }));
    assert_eq!(cluster.call_count(), 0);
}

#[test]
fn invalid_selector_fails_at_configuration_time() {
    let result = RunConfig::from_args(
        CliArgs::try_parse_from(["preflight", "--target-version", "3.0.0", "--check", "["])
            .unwrap(),
    );
    assert!(matches!(result, Err(PreflightError::InvalidSelector { .. })));
}

#[tokio::test]
async fn selector_subset_runs_exactly_the_matching_checks() {
    let registry = checks::builtin_registry();
    let selectors = SelectorSet::parse(&["workload", "services.registry.*"]).unwrap();
    let target = Target::new(healthy_cluster().into_shared()).with_versions(
        Some("2.17.0".parse().unwrap()),
        Some("3.0.0".parse().unwrap()),
    );
    let executor = Executor::new(&registry, &selectors);

    let (executions, err) = executor.run_all(&target).await;
    assert!(err.is_none());
    assert_eq!(
        executed_ids(&executions),
        vec![
            "services.registry.pull-secret",
            "workloads.ray.impacted-workloads",
            "workloads.notebooks.idle-sessions",
        ]
    );
}

struct SlowCheck;

#[async_trait]
impl PlatformCheck for SlowCheck {
    fn id(&self) -> &str {
        "dependencies.slow.network"
    }
    fn name(&self) -> &str {
        "slow-network"
    }
    fn description(&self) -> &str {
        "never finishes in time"
    }
    fn group(&self) -> Group {
        Group::Dependency
    }
    async fn can_apply(&self, _target: &Target) -> AnyResult<bool> {
        Ok(true)
    }
    async fn validate(&self, _target: &Target) -> AnyResult<DiagnosticResult> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        unreachable!("the run timeout fires first")
    }
}

#[tokio::test(start_paused = true)]
async fn run_timeout_aborts_a_stuck_check() {
    let config = config(&[
        "--current-version",
        "2.17.0",
        "--target-version",
        "3.0.0",
        "--timeout",
        "5",
    ]);
    let mut registry = CheckRegistry::new();
    registry.register(Box::new(SlowCheck));
    let cluster: Arc<dyn ClusterReader> = StaticCluster::new().into_shared();

    let err = run_preflight(&config, &registry, cluster).await.unwrap_err();
    assert!(matches!(err, PreflightError::Timeout { seconds: 5 }));
}

fn sample_executions() -> Vec<CheckExecution> {
    let entry = |group: Group, kind: &str, name: &str, impact: Impact| {
        let (status, reason) = match impact {
            Impact::None => (ConditionStatus::True, "Healthy"),
            _ => (ConditionStatus::False, "Incompatible"),
        };
        CheckExecution::new(
            format!("{group}.{name}"),
            DiagnosticResult::new(group, kind, name, "sample").with_condition(Condition::new(
                "Compatible",
                status,
                reason,
                "finding",
                impact,
            )),
        )
    };

    vec![
        entry(Group::Dependency, "Node", "kubernetes-server-version", Impact::None),
        entry(Group::Dependency, "StorageClass", "default-storage-class", Impact::Blocking),
        entry(Group::Service, "Secret", "registry-pull-secret", Impact::None),
        entry(Group::Service, "Service", "metrics-service", Impact::Advisory),
        entry(Group::Component, "Deployment", "model-registry-disabled", Impact::None),
        entry(Group::Component, "Deployment", "operator-ready", Impact::Blocking),
        entry(Group::Workload, "Notebook", "notebook-sessions", Impact::Advisory),
        entry(Group::Workload, "RayCluster", "ray-impacted-workloads", Impact::None),
    ]
}

proptest! {
    #[test]
    fn listing_order_is_invariant_under_permutation(
        shuffled in Just(sample_executions()).prop_shuffle()
    ) {
        let mut canonical = sample_executions();
        sort_listing(&mut canonical);

        let mut shuffled = shuffled;
        sort_listing(&mut shuffled);
        prop_assert_eq!(shuffled, canonical);
    }

    #[test]
    fn display_row_order_is_invariant_under_permutation(
        shuffled in Just(sample_executions()).prop_shuffle()
    ) {
        let row_keys = |executions: &[CheckExecution]| -> Vec<(String, Impact)> {
            display_rows(executions)
                .iter()
                .map(|r| (r.execution.check_id.clone(), r.condition.impact))
                .collect()
        };

        let canonical = sample_executions();
        prop_assert_eq!(row_keys(&shuffled), row_keys(&canonical));
    }

    #[test]
    fn verdict_ignores_execution_order(
        shuffled in Just(sample_executions()).prop_shuffle()
    ) {
        prop_assert_eq!(verdict(&shuffled), Impact::Blocking);
    }
}
