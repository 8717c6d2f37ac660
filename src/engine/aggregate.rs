//! Aggregation: deterministic ordering, run summary, and the verdict.

use serde::{Deserialize, Serialize};

use crate::engine::types::{CheckExecution, Condition, Impact};

/// Run-level verdict: the maximum severity across all conditions of all
/// executions. Any blocking condition anywhere makes the whole run blocking.
pub fn verdict(executions: &[CheckExecution]) -> Impact {
    executions
        .iter()
        .flat_map(|e| e.result.conditions.iter())
        .map(|c| c.impact)
        .max()
        .unwrap_or(Impact::None)
}

/// Sort into listing order: canonical group order, then kind (lexical), then
/// check name (lexical). This is the order structured output serializes in.
/// The sort is stable and the key is total over the result identity, so any
/// permutation of the same executions lists identically.
pub fn sort_listing(executions: &mut [CheckExecution]) {
    executions.sort_by(|a, b| {
        a.result
            .group
            .order()
            .cmp(&b.result.group.order())
            .then_with(|| a.result.kind.cmp(&b.result.kind))
            .then_with(|| a.result.name.cmp(&b.result.name))
            .then_with(|| a.check_id.cmp(&b.check_id))
    });
}

/// One table row: a condition joined with its owning execution.
pub struct DisplayRow<'a> {
    pub execution: &'a CheckExecution,
    pub condition: &'a Condition,
}

/// Flatten executions into display-ordered rows for tabular output: canonical
/// group order, then kind (lexical); within a kind each condition row is
/// ordered by its own impact (most severe first), then check name. Rows of a
/// mixed-severity check interleave with other checks of the same kind.
pub fn display_rows(executions: &[CheckExecution]) -> Vec<DisplayRow<'_>> {
    let mut rows: Vec<DisplayRow<'_>> = executions
        .iter()
        .flat_map(|execution| {
            execution
                .result
                .conditions
                .iter()
                .map(move |condition| DisplayRow { execution, condition })
        })
        .collect();
    rows.sort_by(|a, b| {
        a.execution
            .result
            .group
            .order()
            .cmp(&b.execution.result.group.order())
            .then_with(|| a.execution.result.kind.cmp(&b.execution.result.kind))
            .then_with(|| b.condition.impact.cmp(&a.condition.impact))
            .then_with(|| a.execution.result.name.cmp(&b.execution.result.name))
            .then_with(|| a.execution.check_id.cmp(&b.execution.check_id))
    });
    rows
}

/// Per-run tallies for the summary line and structured envelope. Counted per
/// check execution: any blocking condition marks it failed, else any
/// advisory marks it a warning, else it passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub warnings: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn tally(executions: &[CheckExecution]) -> Self {
        let mut summary = RunSummary { total: executions.len(), ..Default::default() };
        for execution in executions {
            match execution.result.max_impact() {
                Impact::Blocking => summary.failed += 1,
                Impact::Advisory => summary.warnings += 1,
                Impact::None => summary.passed += 1,
            }
        }
        summary
    }
}
