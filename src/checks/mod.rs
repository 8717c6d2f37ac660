//! Built-in check implementations organized by group.

pub mod component;
pub mod dependency;
pub mod service;
pub mod workload;

use crate::engine::check::CheckRegistry;

/// Create a registry with every built-in check registered in its canonical
/// position. Registration happens once per command invocation.
pub fn builtin_registry() -> CheckRegistry {
    let mut registry = CheckRegistry::new();

    registry.register(Box::new(dependency::KubernetesVersionCheck));
    registry.register(Box::new(dependency::DefaultStorageClassCheck));

    registry.register(Box::new(service::MetricsServiceCheck));
    registry.register(Box::new(service::RegistryPullSecretCheck));

    registry.register(Box::new(component::ModelRegistryDisabledCheck));
    registry.register(Box::new(component::OperatorReadyCheck));

    registry.register(Box::new(workload::RayImpactedWorkloadsCheck));
    registry.register(Box::new(workload::NotebookSessionsCheck));

    registry
}
