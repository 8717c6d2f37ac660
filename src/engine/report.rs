//! Rendering: human table plus JSON/YAML envelopes.
//!
//! Structured output serializes in listing order; the table uses display
//! order so the most actionable findings surface first.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::engine::aggregate::{self, RunSummary};
use crate::engine::check::{CheckRegistry, ObjectFormatter};
use crate::engine::types::{CheckExecution, Condition, Impact, ObjectRef};
use crate::error::PreflightError;
use crate::version::PlatformVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Top-level structured envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_version: Option<String>,
    pub summary: RunSummary,
    pub results: Vec<EnvelopeEntry>,
}

/// One condition flattened into a structured result entry.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeEntry {
    pub group: String,
    pub kind: String,
    pub check: String,
    pub name: String,
    pub status: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

pub struct Renderer<'a> {
    registry: &'a CheckRegistry,
    verbose: bool,
}

struct DefaultFormatter;

impl ObjectFormatter for DefaultFormatter {
    fn format_object(&self, object: &ObjectRef) -> String {
        let mut line = match &object.namespace {
            Some(ns) => format!("{}/{}", ns, object.name),
            None => object.name.clone(),
        };
        for (key, value) in &object.annotations {
            line.push_str(&format!(" {key}={value}"));
        }
        line
    }
}

impl<'a> Renderer<'a> {
    pub fn new(registry: &'a CheckRegistry, verbose: bool) -> Self {
        Self { registry, verbose }
    }

    /// Build the structured envelope in listing order.
    pub fn envelope(
        &self,
        executions: &[CheckExecution],
        current: Option<&PlatformVersion>,
        target: Option<&PlatformVersion>,
    ) -> Envelope {
        let mut ordered = executions.to_vec();
        aggregate::sort_listing(&mut ordered);

        let mut results = Vec::new();
        for execution in &ordered {
            let details = self.execution_details(execution);
            for condition in &execution.result.conditions {
                results.push(EnvelopeEntry {
                    group: execution.result.group.to_string(),
                    kind: execution.result.kind.clone(),
                    check: execution.check_id.clone(),
                    name: execution.result.name.clone(),
                    status: condition.status.to_string(),
                    reason: condition.reason.clone(),
                    impact: (condition.impact != Impact::None).then_some(condition.impact),
                    message: condition.message.clone(),
                    remediation: condition.remediation.clone(),
                    details: details.clone(),
                });
            }
        }

        Envelope {
            generated_at: Utc::now(),
            current_version: current.map(ToString::to_string),
            target_version: target.map(ToString::to_string),
            summary: RunSummary::tally(executions),
            results,
        }
    }

    pub fn render_json(
        &self,
        executions: &[CheckExecution],
        current: Option<&PlatformVersion>,
        target: Option<&PlatformVersion>,
    ) -> Result<String, PreflightError> {
        let envelope = self.envelope(executions, current, target);
        serde_json::to_string_pretty(&envelope)
            .map_err(|err| PreflightError::Render { format: "json", source: err.into() })
    }

    pub fn render_yaml(
        &self,
        executions: &[CheckExecution],
        current: Option<&PlatformVersion>,
        target: Option<&PlatformVersion>,
    ) -> Result<String, PreflightError> {
        let envelope = self.envelope(executions, current, target);
        serde_yaml::to_string(&envelope)
            .map_err(|err| PreflightError::Render { format: "yaml", source: err.into() })
    }

    /// Human-readable table in display order with a trailing summary line.
    pub fn render_table(
        &self,
        executions: &[CheckExecution],
        current: Option<&PlatformVersion>,
        target: Option<&PlatformVersion>,
    ) -> String {
        let rows = aggregate::display_rows(executions);

        let cells: Vec<[String; 6]> = rows
            .iter()
            .map(|row| {
                [
                    status_symbol(row.condition).to_string(),
                    row.execution.result.kind.clone(),
                    row.execution.result.group.to_string(),
                    row.execution.result.name.clone(),
                    row.condition.impact.to_string(),
                    row.condition.message.clone(),
                ]
            })
            .collect();

        let header = ["", "KIND", "GROUP", "CHECK", "IMPACT", "MESSAGE"];
        let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        if let (Some(current), Some(target)) = (current, target) {
            out.push_str(&format!("Upgrade assessment: {current} -> {target}\n\n"));
        } else if let Some(current) = current {
            out.push_str(&format!("Installed version: {current}\n\n"));
        }

        push_row(&mut out, &header.map(String::from), &widths);
        for (index, row) in cells.iter().enumerate() {
            push_row(&mut out, row, &widths);
            if self.verbose {
                // Impacted objects belong to the execution; print them once,
                // after its last row in display order.
                let execution = rows[index].execution;
                let is_last =
                    !rows[index + 1..].iter().any(|r| std::ptr::eq(r.execution, execution));
                if is_last && !execution.result.impacted_objects.is_empty() {
                    let default = DefaultFormatter;
                    let formatter = self
                        .registry
                        .by_id(&execution.check_id)
                        .and_then(|check| check.formatter())
                        .unwrap_or(&default);
                    for object in &execution.result.impacted_objects {
                        out.push_str(&format!("    - {}\n", formatter.format_object(object)));
                    }
                }
            }
        }

        let summary = RunSummary::tally(executions);
        out.push_str(&format!(
            "\n{} checks: {} passed, {} warnings, {} failed\n",
            summary.total, summary.passed, summary.warnings, summary.failed
        ));
        out
    }

    /// NoOp mode output: version information only, no checks.
    pub fn render_version_only(
        &self,
        format: OutputFormat,
        current: Option<&PlatformVersion>,
    ) -> Result<String, PreflightError> {
        match format {
            OutputFormat::Table => Ok(match current {
                Some(current) => {
                    format!("Installed version: {current}\nNothing to assess.\n")
                }
                None => "Installed version could not be determined.\n".to_string(),
            }),
            OutputFormat::Json => self.render_json(&[], current, None),
            OutputFormat::Yaml => self.render_yaml(&[], current, None),
        }
    }

    pub fn render(
        &self,
        format: OutputFormat,
        executions: &[CheckExecution],
        current: Option<&PlatformVersion>,
        target: Option<&PlatformVersion>,
    ) -> Result<String, PreflightError> {
        match format {
            OutputFormat::Table => Ok(self.render_table(executions, current, target)),
            OutputFormat::Json => self.render_json(executions, current, target),
            OutputFormat::Yaml => self.render_yaml(executions, current, target),
        }
    }

    fn execution_details(&self, execution: &CheckExecution) -> Option<serde_json::Value> {
        let mut details = serde_json::Map::new();
        if !execution.result.annotations.is_empty() {
            details.insert(
                "annotations".to_string(),
                serde_json::to_value(&execution.result.annotations).unwrap_or_default(),
            );
        }
        if self.verbose && !execution.result.impacted_objects.is_empty() {
            details.insert(
                "impactedObjects".to_string(),
                serde_json::to_value(&execution.result.impacted_objects).unwrap_or_default(),
            );
        }
        (!details.is_empty()).then(|| serde_json::Value::Object(details))
    }
}

fn status_symbol(condition: &Condition) -> &'static str {
    match condition.impact {
        Impact::Blocking => "✗",
        Impact::Advisory => "!",
        Impact::None => "✓",
    }
}

fn push_row(out: &mut String, row: &[String; 6], widths: &[usize]) {
    let mut line = String::new();
    for (i, cell) in row.iter().enumerate() {
        line.push_str(cell);
        if i < row.len() - 1 {
            let pad = widths[i].saturating_sub(cell.chars().count()) + 2;
            line.extend(std::iter::repeat(' ').take(pad));
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}
