//! Error taxonomy for the preflight engine.
//!
//! Input validation and version-transition errors are fatal before any
//! cluster access. Gate and validate errors share the same fail-fast
//! semantics. In-check findings are never errors; they travel as
//! [`Condition`](crate::engine::types::Condition)s.

use thiserror::Error;

use crate::cluster::ClusterError;

/// Process exit code for a clean run.
pub const EXIT_OK: i32 = 0;
/// Process exit code for any unrecovered engine error.
pub const EXIT_ERROR: i32 = 1;
/// Process exit code when the verdict trips the configured fail-on level.
pub const EXIT_VERDICT: i32 = 2;

#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("invalid check selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("no check selectors supplied; use '*' to run everything")]
    EmptySelectorSet,

    #[error("invalid version string '{input}'")]
    InvalidVersion { input: String },

    #[error("timeout must be greater than zero")]
    InvalidTimeout,

    #[error("client throttling requires qps and burst greater than zero")]
    InvalidThrottle,

    #[error("downgrade from {current} to {target} is not supported")]
    Downgrade { current: String, target: String },

    #[error("applicability gate for check '{check_id}' failed: {source}")]
    GateFailed {
        check_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("check '{check_id}' failed: {source}")]
    CheckFailed {
        check_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("preflight run timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error("failed to render {format} output: {source}")]
    Render {
        format: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl PreflightError {
    /// Coarse classification used in structured logs.
    pub fn category(&self) -> &'static str {
        match self {
            PreflightError::InvalidSelector { .. }
            | PreflightError::EmptySelectorSet
            | PreflightError::InvalidVersion { .. }
            | PreflightError::InvalidTimeout
            | PreflightError::InvalidThrottle => "input_validation",
            PreflightError::Downgrade { .. } => "version_transition",
            PreflightError::GateFailed { .. } | PreflightError::CheckFailed { .. } => "execution",
            PreflightError::Timeout { .. } => "timeout",
            PreflightError::Cluster(_) => "cluster",
            PreflightError::Render { .. } => "render",
        }
    }

    pub fn exit_code(&self) -> i32 {
        EXIT_ERROR
    }
}
