//! Read-only cluster access capability.
//!
//! Checks never talk to the cluster directly; they go through
//! [`ClusterReader`], a narrow read-only view constructed once per run and
//! shared by every check. Client construction and authentication live with
//! the caller; the engine only depends on this trait.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("cluster unreachable: {0}")]
    Unreachable(String),

    #[error("not authorized to read {kind} '{name}'")]
    Unauthorized { kind: String, name: String },

    #[error("request throttled by the API server")]
    Throttled,

    #[error("cluster API error: {0}")]
    Api(String),
}

/// Client-side throttling parameters handed to the cluster client
/// constructor. Serial check execution keeps the effective request rate at
/// or below this ceiling.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleConfig {
    pub qps: f32,
    pub burst: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self { qps: 5.0, burst: 10 }
    }
}

/// Read-only view of live cluster state.
///
/// An absent object is `Ok(None)`, not an error; check authors decide
/// whether absence is a finding or unexpected.
#[async_trait]
pub trait ClusterReader: Send + Sync {
    async fn get(
        &self,
        kind: &str,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<Value>, ClusterError>;

    async fn list(&self, kind: &str, namespace: Option<&str>) -> Result<Vec<Value>, ClusterError>;
}

/// In-memory [`ClusterReader`] backed by a fixed set of objects.
///
/// Serves demos and the test suite; the call counter lets tests assert that
/// validation failures happen before any cluster I/O.
#[derive(Default)]
pub struct StaticCluster {
    objects: HashMap<(String, Option<String>, String), Value>,
    calls: AtomicUsize,
}

impl StaticCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(
        mut self,
        kind: &str,
        namespace: Option<&str>,
        name: &str,
        value: Value,
    ) -> Self {
        self.objects.insert(
            (kind.to_string(), namespace.map(str::to_string), name.to_string()),
            value,
        );
        self
    }

    /// Load a cluster snapshot: a JSON array of `{kind, namespace, name,
    /// object}` entries. Lets the binary run against captured state when no
    /// live client is wired in.
    pub fn from_snapshot(path: &Path) -> anyhow::Result<Self> {
        #[derive(Deserialize)]
        struct SnapshotEntry {
            kind: String,
            #[serde(default)]
            namespace: Option<String>,
            name: String,
            object: Value,
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| anyhow::anyhow!("failed to read snapshot {path:?}: {err}"))?;
        let entries: Vec<SnapshotEntry> = serde_json::from_str(&raw)
            .map_err(|err| anyhow::anyhow!("failed to parse snapshot {path:?}: {err}"))?;

        let mut cluster = Self::new();
        for entry in entries {
            cluster.objects.insert((entry.kind, entry.namespace, entry.name), entry.object);
        }
        Ok(cluster)
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Number of read requests served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ClusterReader for StaticCluster {
    async fn get(
        &self,
        kind: &str,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<Value>, ClusterError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let key = (kind.to_string(), namespace.map(str::to_string), name.to_string());
        Ok(self.objects.get(&key).cloned())
    }

    async fn list(&self, kind: &str, namespace: Option<&str>) -> Result<Vec<Value>, ClusterError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let mut items: Vec<(&String, &Value)> = self
            .objects
            .iter()
            .filter(|((k, ns, _), _)| {
                k == kind && (namespace.is_none() || ns.as_deref() == namespace)
            })
            .map(|((_, _, name), value)| (name, value))
            .collect();
        // Deterministic listing keeps snapshot-style assertions stable.
        items.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(items.into_iter().map(|(_, value)| value.clone()).collect())
    }
}
