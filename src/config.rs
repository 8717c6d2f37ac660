//! CLI surface and run configuration.
//!
//! All validation is fail-fast: bad selectors, formats, timeouts, or version
//! strings are rejected here, before a cluster client is ever constructed.

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cluster::ThrottleConfig;
use crate::engine::report::OutputFormat;
use crate::engine::selector::SelectorSet;
use crate::engine::types::Impact;
use crate::error::PreflightError;
use crate::version::PlatformVersion;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Verdict level at which the process exits non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailOn {
    Blocking,
    Advisory,
}

impl FailOn {
    pub fn triggers(self, verdict: Impact) -> bool {
        match self {
            FailOn::Blocking => verdict >= Impact::Blocking,
            FailOn::Advisory => verdict >= Impact::Advisory,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "preflight",
    about = "Assess a platform installation for upgrade compatibility",
    version
)]
pub struct CliArgs {
    /// Target platform version to assess against; omit to run in lint mode
    #[arg(long, env = "PREFLIGHT_TARGET_VERSION")]
    pub target_version: Option<String>,

    /// Override the installed version instead of discovering it
    #[arg(long)]
    pub current_version: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Check selector: '*', a group name, or a glob over check IDs
    /// (repeatable; OR-combined)
    #[arg(long = "check", value_name = "SELECTOR")]
    pub checks: Vec<String>,

    /// List impacted objects per finding
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Overall run timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Cluster client queries-per-second ceiling
    #[arg(long, default_value_t = 5.0)]
    pub qps: f32,

    /// Cluster client burst allowance
    #[arg(long, default_value_t = 10)]
    pub burst: u32,

    /// Verdict level that produces a non-zero exit code
    #[arg(long, value_enum, default_value_t = FailOn::Blocking)]
    pub fail_on: FailOn,

    /// Assess a captured cluster snapshot instead of a live cluster
    #[arg(long, env = "PREFLIGHT_CLUSTER_SNAPSHOT", value_name = "PATH")]
    pub cluster_snapshot: Option<std::path::PathBuf>,
}

/// Validated run configuration.
#[derive(Debug)]
pub struct RunConfig {
    pub target_version: Option<PlatformVersion>,
    pub current_version: Option<PlatformVersion>,
    pub output: OutputFormat,
    pub selectors: SelectorSet,
    pub verbose: bool,
    pub timeout: Duration,
    /// Consumed by the live cluster client constructor, which is wired in by
    /// the caller; the in-memory snapshot reader ignores it.
    pub throttle: ThrottleConfig,
    pub fail_on: FailOn,
    pub cluster_snapshot: Option<std::path::PathBuf>,
}

impl RunConfig {
    pub fn from_args(args: CliArgs) -> Result<Self, PreflightError> {
        let target_version =
            args.target_version.as_deref().map(PlatformVersion::parse).transpose()?;
        let current_version =
            args.current_version.as_deref().map(PlatformVersion::parse).transpose()?;

        // An explicitly empty selector set is a validation error; the
        // default (no --check flags) means match-all.
        let selectors = if args.checks.is_empty() {
            SelectorSet::match_all()
        } else {
            SelectorSet::parse(&args.checks)?
        };

        if args.timeout == 0 {
            return Err(PreflightError::InvalidTimeout);
        }
        if args.qps <= 0.0 || args.burst == 0 {
            return Err(PreflightError::InvalidThrottle);
        }

        Ok(Self {
            target_version,
            current_version,
            output: args.output,
            selectors,
            verbose: args.verbose,
            timeout: Duration::from_secs(args.timeout),
            throttle: ThrottleConfig { qps: args.qps, burst: args.burst },
            fail_on: args.fail_on,
            cluster_snapshot: args.cluster_snapshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["preflight"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        let config = RunConfig::from_args(args(&[])).unwrap();
        assert_eq!(config.output, OutputFormat::Table);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(config.target_version.is_none());
        assert_eq!(config.fail_on, FailOn::Blocking);
    }

    #[test]
    fn parses_versions_and_selectors() {
        let config = RunConfig::from_args(args(&[
            "--target-version",
            "3.0",
            "--current-version",
            "2.17.0",
            "--check",
            "workload",
            "--check",
            "components.*",
        ]))
        .unwrap();
        assert_eq!(config.target_version, Some(PlatformVersion::new(3, 0, 0)));
        assert_eq!(config.selectors.describe(), "workload,components.*");
    }

    #[test]
    fn rejects_invalid_target_version() {
        let result = RunConfig::from_args(args(&["--target-version", "three-ish"]));
        assert_matches!(result, Err(PreflightError::InvalidVersion { .. }));
    }

    #[test]
    fn rejects_invalid_selector_before_running() {
        let result = RunConfig::from_args(args(&["--check", "["]));
        assert_matches!(result, Err(PreflightError::InvalidSelector { .. }));
    }

    #[test]
    fn rejects_zero_timeout_and_throttle() {
        assert_matches!(
            RunConfig::from_args(args(&["--timeout", "0"])),
            Err(PreflightError::InvalidTimeout)
        );
        assert_matches!(
            RunConfig::from_args(args(&["--qps", "0"])),
            Err(PreflightError::InvalidThrottle)
        );
        assert_matches!(
            RunConfig::from_args(args(&["--burst", "0"])),
            Err(PreflightError::InvalidThrottle)
        );
    }

    #[test]
    fn fail_on_levels() {
        assert!(FailOn::Blocking.triggers(Impact::Blocking));
        assert!(!FailOn::Blocking.triggers(Impact::Advisory));
        assert!(FailOn::Advisory.triggers(Impact::Advisory));
        assert!(FailOn::Advisory.triggers(Impact::Blocking));
        assert!(!FailOn::Advisory.triggers(Impact::None));
    }
}
