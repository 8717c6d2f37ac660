//! Check execution engine.
//!
//! Serial by design: checks share one throttled cluster client, so running
//! them one at a time keeps request load flat and needs no per-check
//! synchronization. Within a group, checks run in registration order; the
//! first gate or validate error aborts the remainder of that group while
//! earlier groups keep their results.

use tracing::{debug, info, warn};

use crate::engine::check::{CheckRegistry, Target};
use crate::engine::selector::SelectorSet;
use crate::engine::types::{CheckExecution, Group};
use crate::error::PreflightError;

pub struct Executor<'a> {
    registry: &'a CheckRegistry,
    selectors: &'a SelectorSet,
}

impl<'a> Executor<'a> {
    pub fn new(registry: &'a CheckRegistry, selectors: &'a SelectorSet) -> Self {
        Self { registry, selectors }
    }

    /// Run every selected, applicable check in one group, in registration
    /// order. Fail-fast: a gate or validate error aborts the remaining
    /// checks of this group.
    pub async fn run_group(
        &self,
        group: Group,
        target: &Target,
    ) -> Result<Vec<CheckExecution>, PreflightError> {
        let mut executions = Vec::new();

        for check in self.registry.by_group(group) {
            if !self.selectors.matches(check) {
                debug!(check = check.id(), "skipped by selector");
                continue;
            }

            let applies = check.can_apply(target).await.map_err(|source| {
                warn!(check = check.id(), error = %source, "applicability gate failed");
                PreflightError::GateFailed { check_id: check.id().to_string(), source }
            })?;
            if !applies {
                debug!(check = check.id(), "not applicable to this transition");
                continue;
            }

            let result = check.validate(target).await.map_err(|source| {
                warn!(check = check.id(), error = %source, "check failed");
                PreflightError::CheckFailed { check_id: check.id().to_string(), source }
            })?;
            debug!(
                check = check.id(),
                conditions = result.conditions.len(),
                impact = %result.max_impact(),
                "check completed"
            );
            executions.push(CheckExecution::new(check.id(), result));
        }

        Ok(executions)
    }

    /// Run all groups in canonical order. Results of groups completed before
    /// an error are returned alongside it so the caller decides how much to
    /// surface.
    pub async fn run_all(
        &self,
        target: &Target,
    ) -> (Vec<CheckExecution>, Option<PreflightError>) {
        let mut executions = Vec::new();

        for group in Group::ALL {
            info!(group = %group, "executing check group");
            match self.run_group(group, target).await {
                Ok(mut group_executions) => {
                    info!(group = %group, checks = group_executions.len(), "group complete");
                    executions.append(&mut group_executions);
                }
                Err(err) => {
                    warn!(group = %group, error = %err, "group aborted");
                    return (executions, Some(err));
                }
            }
        }

        (executions, None)
    }
}
