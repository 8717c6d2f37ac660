//! Result model shared by the executor, aggregator, and renderers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Canonical check classification. [`Group::ALL`] is also the canonical
/// execution and listing order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Dependency,
    Service,
    Component,
    Workload,
}

impl Group {
    pub const ALL: [Group; 4] =
        [Group::Dependency, Group::Service, Group::Component, Group::Workload];

    /// Position in the canonical order, for sorting mixed sequences.
    pub fn order(self) -> usize {
        Group::ALL.iter().position(|g| *g == self).unwrap_or(usize::MAX)
    }
}

/// Severity of a single condition. Ordering is semantic: `None < Advisory <
/// Blocking`, so the run verdict is simply the maximum observed impact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    None,
    Advisory,
    Blocking,
}

/// Tri-state outcome of one condition evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "PascalCase")]
#[serde(rename_all = "PascalCase")]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// One finding inside a diagnostic result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Free-form classification, e.g. "Compatible" or "Configured".
    pub condition_type: String,
    pub status: ConditionStatus,
    /// Machine-readable reason code, e.g. "ResourceNotFound".
    pub reason: String,
    pub message: String,
    pub impact: Impact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl Condition {
    pub fn new(
        condition_type: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
        impact: Impact,
    ) -> Self {
        Self {
            condition_type: condition_type.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            impact,
            remediation: None,
        }
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    /// A passing observation with no impact.
    pub fn passed(
        condition_type: impl Into<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(condition_type, ConditionStatus::True, reason, message, Impact::None)
    }
}

/// Reference to an object a check found to be affected by the upgrade.
/// Listed in verbose output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: IndexMap<String, String>,
}

impl ObjectRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), namespace: None, annotations: IndexMap::new() }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn annotate(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

/// Structured output of one check's `validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub group: Group,
    /// Resource or component type being checked, e.g. "RayCluster".
    pub kind: String,
    /// Check name, the secondary sort key within a kind.
    pub name: String,
    pub description: String,
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub impacted_objects: Vec<ObjectRef>,
}

impl DiagnosticResult {
    pub fn new(
        group: Group,
        kind: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            group,
            kind: kind.into(),
            name: name.into(),
            description: description.into(),
            conditions: Vec::new(),
            annotations: IndexMap::new(),
            impacted_objects: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_impacted_object(mut self, object: ObjectRef) -> Self {
        self.impacted_objects.push(object);
        self
    }

    /// Highest impact among this result's conditions.
    pub fn max_impact(&self) -> Impact {
        self.conditions.iter().map(|c| c.impact).max().unwrap_or(Impact::None)
    }
}

/// A check paired with the result it produced; the unit the executor emits
/// and the aggregator consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckExecution {
    pub check_id: String,
    pub result: DiagnosticResult,
}

impl CheckExecution {
    pub fn new(check_id: impl Into<String>, result: DiagnosticResult) -> Self {
        Self { check_id: check_id.into(), result }
    }
}
