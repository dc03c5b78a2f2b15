//! Classification of installed subjects against their latest known versions

use serde::{Deserialize, Serialize};

use crate::version::checker::{VersionStatus, compare_versions};

/// A locally installed package (plugin, theme, binary) whose version is checked
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: String,
    pub current_version: String,
}

impl Subject {
    pub fn new(name: &str, current_version: &str) -> Self {
        Self {
            name: name.to_string(),
            current_version: current_version.to_string(),
        }
    }
}

/// Per-subject row ready for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectReport {
    pub name: String,
    pub current_version: String,
    pub latest_version: String,
    pub status: VersionStatus,
}

/// Classify one subject. Without a known latest version the subject is
/// reported as current, with its own version shown as the latest.
pub fn classify_subject(subject: &Subject, latest: Option<&str>) -> SubjectReport {
    let latest_version = latest.unwrap_or(&subject.current_version);
    let status = compare_versions(&subject.current_version, latest_version).status();

    SubjectReport {
        name: subject.name.clone(),
        current_version: subject.current_version.clone(),
        latest_version: latest_version.to_string(),
        status,
    }
}

/// Classify every subject, looking up its latest version with `lookup`
pub fn classify_subjects<F>(subjects: &[Subject], lookup: F) -> Vec<SubjectReport>
where
    F: Fn(&Subject) -> Option<String>,
{
    subjects
        .iter()
        .map(|subject| classify_subject(subject, lookup(subject).as_deref()))
        .collect()
}
