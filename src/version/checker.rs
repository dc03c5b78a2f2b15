//! Version comparison between a locally known version and the latest release

use std::cmp::Ordering;

use serde::Serialize;

use crate::version::semver::LooseVersion;

/// Result of comparing a current version against the latest one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionComparisonResult {
    /// Ordering of current relative to latest
    pub ordering: Ordering,
    /// True iff current is older than latest
    pub update_available: bool,
}

impl VersionComparisonResult {
    pub fn status(&self) -> VersionStatus {
        if self.update_available {
            VersionStatus::Outdated
        } else {
            VersionStatus::Current
        }
    }
}

/// Display classification of a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    /// Same as, or ahead of, the latest known version
    Current,
    /// Older than the latest known version
    Outdated,
}

impl VersionStatus {
    pub fn is_outdated(&self) -> bool {
        matches!(self, VersionStatus::Outdated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Current => "current",
            VersionStatus::Outdated => "outdated",
        }
    }
}

/// Compare `current` to `latest` using loose dotted-numeric ordering.
///
/// Never fails: unparseable input compares as version `0`.
pub fn compare_versions(current: &str, latest: &str) -> VersionComparisonResult {
    let ordering = LooseVersion::parse(current).cmp(&LooseVersion::parse(latest));

    VersionComparisonResult {
        ordering,
        update_available: ordering == Ordering::Less,
    }
}
