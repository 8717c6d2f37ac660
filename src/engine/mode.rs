//! Run mode state machine.
//!
//! Entered once per run from the resolved current/target versions; there is
//! no backward transition.

use crate::error::PreflightError;
use crate::version::PlatformVersion;

/// What this invocation is assessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Current and target share a release line (or no target was requested).
    /// Nothing to assess; the run reports version information only.
    NoOp,
    /// Target is strictly newer at the major.minor level. Checks execute.
    Upgrade,
    /// Target is strictly older. Terminal; surfaces an error before any
    /// check runs.
    RejectedDowngrade,
}

impl RunMode {
    /// Transition rule, evaluated in order: same major.minor (patch
    /// difference ignored) -> NoOp; target < current -> RejectedDowngrade;
    /// otherwise Upgrade. A missing target means lint mode (NoOp); a missing
    /// current with a target present proceeds as Upgrade and leaves the
    /// decision to each gate.
    pub fn resolve(
        current: Option<&PlatformVersion>,
        target: Option<&PlatformVersion>,
    ) -> RunMode {
        let Some(target) = target else {
            return RunMode::NoOp;
        };
        let Some(current) = current else {
            return RunMode::Upgrade;
        };
        if current.same_release_line(target) {
            RunMode::NoOp
        } else if target.major_minor() < current.major_minor() {
            RunMode::RejectedDowngrade
        } else {
            RunMode::Upgrade
        }
    }

    /// Convert a rejected downgrade into its fatal error.
    pub fn ensure_not_downgrade(
        self,
        current: Option<&PlatformVersion>,
        target: Option<&PlatformVersion>,
    ) -> Result<RunMode, PreflightError> {
        if self == RunMode::RejectedDowngrade {
            return Err(PreflightError::Downgrade {
                current: current.map(ToString::to_string).unwrap_or_default(),
                target: target.map(ToString::to_string).unwrap_or_default(),
            });
        }
        Ok(self)
    }
}
