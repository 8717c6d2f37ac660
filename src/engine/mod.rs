//! The check execution engine: contract, registry, selectors, applicability
//! gating, serial execution, aggregation, and rendering.

pub mod aggregate;
pub mod check;
pub mod executor;
pub mod mode;
pub mod report;
pub mod selector;
pub mod types;

pub use aggregate::{DisplayRow, RunSummary, display_rows, sort_listing, verdict};
pub use check::{CheckRegistry, ObjectFormatter, PlatformCheck, Target};
pub use executor::Executor;
pub use mode::RunMode;
pub use report::{Envelope, OutputFormat, Renderer};
pub use selector::SelectorSet;
pub use types::{
    CheckExecution, Condition, ConditionStatus, DiagnosticResult, Group, Impact, ObjectRef,
};
