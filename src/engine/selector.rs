//! Selector matching: resolves user-supplied filter patterns to a subset of
//! registered checks.
//!
//! Three forms are recognized: the literal `*` wildcard, a group name
//! shortcut (`dependency`, `service`, `component`, `workload`), and a glob
//! matched against the check identifier. Pattern errors are surfaced at
//! parse time so a typo aborts the run before any cluster I/O.

use globset::{Glob, GlobMatcher};

use crate::engine::check::PlatformCheck;
use crate::engine::types::Group;
use crate::error::PreflightError;

const WILDCARD: &str = "*";

#[derive(Debug, Clone)]
enum Selector {
    All,
    Category(Group),
    Pattern { raw: String, matcher: GlobMatcher },
}

impl Selector {
    fn parse(input: &str) -> Result<Self, PreflightError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PreflightError::InvalidSelector {
                selector: input.to_string(),
                reason: "selector is empty".to_string(),
            });
        }
        if trimmed == WILDCARD {
            return Ok(Selector::All);
        }
        if let Ok(group) = trimmed.parse::<Group>() {
            return Ok(Selector::Category(group));
        }
        let glob = Glob::new(trimmed).map_err(|err| PreflightError::InvalidSelector {
            selector: input.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Selector::Pattern { raw: trimmed.to_string(), matcher: glob.compile_matcher() })
    }

    fn matches(&self, check: &dyn PlatformCheck) -> bool {
        match self {
            Selector::All => true,
            Selector::Category(group) => check.group() == *group,
            Selector::Pattern { matcher, .. } => matcher.is_match(check.id()),
        }
    }
}

/// A validated, OR-combined set of selectors.
#[derive(Debug, Clone)]
pub struct SelectorSet {
    selectors: Vec<Selector>,
}

impl SelectorSet {
    /// Parse and validate every selector eagerly. An empty input set is
    /// invalid; callers default to `*` explicitly, not implicitly.
    pub fn parse<S: AsRef<str>>(inputs: &[S]) -> Result<Self, PreflightError> {
        if inputs.is_empty() {
            return Err(PreflightError::EmptySelectorSet);
        }
        let selectors = inputs
            .iter()
            .map(|input| Selector::parse(input.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { selectors })
    }

    /// Matches everything; the CLI default.
    pub fn match_all() -> Self {
        Self { selectors: vec![Selector::All] }
    }

    /// A check runs if it matches any selector.
    pub fn matches(&self, check: &dyn PlatformCheck) -> bool {
        self.selectors.iter().any(|s| s.matches(check))
    }

    /// Raw display form for logging.
    pub fn describe(&self) -> String {
        self.selectors
            .iter()
            .map(|s| match s {
                Selector::All => WILDCARD.to_string(),
                Selector::Category(group) => group.to_string(),
                Selector::Pattern { raw, .. } => raw.clone(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}
