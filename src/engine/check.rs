//! Check contract, run target, and the check registry.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::cluster::ClusterReader;
use crate::engine::types::{DiagnosticResult, Group, ObjectRef};
use crate::version::PlatformVersion;

/// Immutable context threaded through every check invocation.
///
/// Versions are resolved once before execution begins and never mutated
/// during a run.
#[derive(Clone)]
pub struct Target {
    pub cluster: Arc<dyn ClusterReader>,
    pub current: Option<PlatformVersion>,
    pub target: Option<PlatformVersion>,
    /// Enables impacted-object listing in human output.
    pub verbose: bool,
}

impl Target {
    pub fn new(cluster: Arc<dyn ClusterReader>) -> Self {
        Self { cluster, current: None, target: None, verbose: false }
    }

    pub fn with_versions(
        mut self,
        current: Option<PlatformVersion>,
        target: Option<PlatformVersion>,
    ) -> Self {
        self.current = current;
        self.target = target;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// True when the transition crosses the given major boundary, e.g.
    /// `crosses_major(3)` for a 2.x -> 3.x upgrade. False when either side
    /// is unknown.
    pub fn crosses_major(&self, boundary: u64) -> bool {
        match (&self.current, &self.target) {
            (Some(current), Some(target)) => {
                current.major() < boundary && target.major() >= boundary
            }
            _ => false,
        }
    }

    /// True when the target version is known and at least `major.minor`.
    pub fn target_at_least(&self, major: u64, minor: u64) -> bool {
        self.target.as_ref().is_some_and(|t| t.major_minor() >= (major, minor))
    }
}

/// Customizes how a check's impacted objects are listed in verbose output.
/// Probed by the renderer; a default formatter is used when absent.
pub trait ObjectFormatter: Send + Sync {
    fn format_object(&self, object: &ObjectRef) -> String;
}

/// The unit of work every diagnostic rule implements.
///
/// Metadata accessors are static and side-effect free. `can_apply` must be
/// cheap; it may read lightweight state and may fail, in which case the
/// failure is treated exactly like a `validate` failure.
#[async_trait]
pub trait PlatformCheck: Send + Sync {
    /// Stable dotted-path identifier, e.g. `workloads.ray.impacted-workloads`.
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn remediation(&self) -> Option<&str> {
        None
    }

    fn group(&self) -> Group;

    /// Whether this rule is relevant to the version transition being
    /// assessed. Evaluated before `validate` so irrelevant checks never
    /// touch the cluster.
    async fn can_apply(&self, target: &Target) -> Result<bool>;

    /// Evaluate the rule against cluster state. Must return a result
    /// whenever it returns `Ok`; expected absences are conditions, not
    /// errors.
    async fn validate(&self, target: &Target) -> Result<DiagnosticResult>;

    /// Optional secondary capability for verbose impacted-object listing.
    fn formatter(&self) -> Option<&dyn ObjectFormatter> {
        None
    }
}

/// Ordered collection of registered checks.
///
/// Request-scoped: one registry per command invocation, registration happens
/// once at startup. Duplicate IDs are a caller error and are not detected
/// here.
#[derive(Default)]
pub struct CheckRegistry {
    checks: Vec<Box<dyn PlatformCheck>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, check: Box<dyn PlatformCheck>) {
        self.checks.push(check);
    }

    pub fn all(&self) -> &[Box<dyn PlatformCheck>] {
        &self.checks
    }

    pub fn by_group(&self, group: Group) -> impl Iterator<Item = &dyn PlatformCheck> {
        self.checks.iter().filter(move |c| c.group() == group).map(|c| c.as_ref())
    }

    pub fn by_id(&self, id: &str) -> Option<&dyn PlatformCheck> {
        self.checks.iter().find(|c| c.id() == id).map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{StubCheck, make_target};
    use super::*;
    use crate::cluster::StaticCluster;
    use crate::engine::types::Impact;

    #[test]
    fn registry_preserves_registration_order() {
        let mut registry = CheckRegistry::new();
        registry.register(Box::new(StubCheck::new("components.b", Group::Component)));
        registry.register(Box::new(StubCheck::new("components.a", Group::Component)));

        let ids: Vec<_> = registry.all().iter().map(|c| c.id().to_string()).collect();
        assert_eq!(ids, vec!["components.b", "components.a"]);
    }

    #[test]
    fn registry_lookup_by_group_and_id() {
        let mut registry = CheckRegistry::new();
        registry.register(Box::new(StubCheck::new("services.x", Group::Service)));
        registry.register(Box::new(StubCheck::new("workloads.y", Group::Workload)));

        assert_eq!(registry.by_group(Group::Service).count(), 1);
        assert_eq!(registry.by_group(Group::Dependency).count(), 0);
        assert!(registry.by_id("workloads.y").is_some());
        assert!(registry.by_id("workloads.z").is_none());
    }

    #[test]
    fn target_boundary_helpers() {
        let target = make_target(StaticCluster::new().into_shared());
        assert!(target.crosses_major(3));
        assert!(!target.crosses_major(2));
        assert!(target.target_at_least(3, 0));
        assert!(!target.target_at_least(3, 1));

        let lint = Target::new(StaticCluster::new().into_shared());
        assert!(!lint.crosses_major(3));
        assert!(!lint.target_at_least(1, 0));
    }

    #[tokio::test]
    async fn stub_check_round_trips() {
        let target = make_target(StaticCluster::new().into_shared());
        let check = StubCheck::new("components.stub", Group::Component).impact(Impact::Blocking);
        assert!(check.can_apply(&target).await.unwrap());
        let result = check.validate(&target).await.unwrap();
        assert_eq!(result.max_impact(), Impact::Blocking);
        assert!(check.formatter().is_none());
    }
}
