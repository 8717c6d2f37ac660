//! Platform version handling.
//!
//! All mode and applicability decisions compare major.minor only; patch
//! precision is available for checks that explicitly need it.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PreflightError;

/// A platform release version with tolerant parsing.
///
/// Accepts full semver strings as well as the partial forms operators
/// actually type: `"3"` and `"3.0"` normalize to `3.0.0`. A leading `v`
/// is stripped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformVersion(Version);

impl PlatformVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    pub fn parse(input: &str) -> Result<Self, PreflightError> {
        let trimmed = input.trim();
        // Accept exactly one leading `v`.
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(PreflightError::InvalidVersion {
                input: input.to_string(),
            });
        }

        // Pad partial versions ("3", "3.0") before handing off to semver.
        // Any missing segment is inserted ahead of a prerelease/build suffix.
        let head = trimmed.split(['-', '+']).next().unwrap_or(trimmed);
        let suffix_at = trimmed.find(['-', '+']);
        let candidate = match head.matches('.').count() {
            0 => match suffix_at {
                Some(at) => format!("{}.0.0{}", &trimmed[..at], &trimmed[at..]),
                None => format!("{trimmed}.0.0"),
            },
            1 => match suffix_at {
                Some(at) => format!("{}.0{}", &trimmed[..at], &trimmed[at..]),
                None => format!("{trimmed}.0"),
            },
            _ => trimmed.to_string(),
        };

        Version::parse(&candidate)
            .map(Self)
            .map_err(|_| PreflightError::InvalidVersion {
                input: input.to_string(),
            })
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// The (major, minor) pair that mode transitions and most applicability
    /// gates compare on.
    pub fn major_minor(&self) -> (u64, u64) {
        (self.0.major, self.0.minor)
    }

    pub fn same_release_line(&self, other: &PlatformVersion) -> bool {
        self.major_minor() == other.major_minor()
    }

    pub fn as_semver(&self) -> &Version {
        &self.0
    }
}

impl FromStr for PlatformVersion {
    type Err = PreflightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_full_semver() {
        let v = PlatformVersion::parse("2.17.3").unwrap();
        assert_eq!(v.major_minor(), (2, 17));
        assert_eq!(v.patch(), 3);
    }

    #[test]
    fn pads_partial_versions() {
        assert_eq!(PlatformVersion::parse("3").unwrap(), PlatformVersion::new(3, 0, 0));
        assert_eq!(PlatformVersion::parse("3.0").unwrap(), PlatformVersion::new(3, 0, 0));
        assert_eq!(PlatformVersion::parse("v3.1").unwrap(), PlatformVersion::new(3, 1, 0));
    }

    #[test]
    fn keeps_prerelease_on_partial_minor() {
        let v = PlatformVersion::parse("3.1-rc.1").unwrap();
        assert_eq!(v.major_minor(), (3, 1));
        assert!(!v.as_semver().pre.is_empty());
    }

    #[test]
    fn rejects_garbage() {
        assert_matches!(
            PlatformVersion::parse("not-a-version"),
            Err(PreflightError::InvalidVersion { .. })
        );
        assert_matches!(PlatformVersion::parse(""), Err(PreflightError::InvalidVersion { .. }));
    }

    #[test]
    fn strips_at_most_one_leading_v() {
        assert_eq!(PlatformVersion::parse("v3").unwrap(), PlatformVersion::new(3, 0, 0));
        assert_matches!(
            PlatformVersion::parse("vv3"),
            Err(PreflightError::InvalidVersion { .. })
        );
    }

    #[test]
    fn orders_by_semver() {
        let older = PlatformVersion::parse("2.17.0").unwrap();
        let newer = PlatformVersion::parse("3.0.0").unwrap();
        assert!(older < newer);
        assert!(!older.same_release_line(&newer));
        assert!(PlatformVersion::new(2, 17, 0).same_release_line(&PlatformVersion::new(2, 17, 9)));
    }
}
