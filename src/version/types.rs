//! Common types for release checking

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::version::error::RepositoryIdError;

/// Repository identifier in `owner/name` form (e.g., "spalmeida/verificador")
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryId {
    owner: String,
    name: String,
}

impl RepositoryId {
    pub fn new(owner: &str, name: &str) -> Result<Self, RepositoryIdError> {
        format!("{}/{}", owner, name).parse()
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Public web page of the repository
    pub fn homepage(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryId {
    type Err = RepositoryIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((owner, name)) = s.split_once('/') else {
            return Err(RepositoryIdError::MissingSeparator(s.to_string()));
        };

        if owner.is_empty() {
            return Err(RepositoryIdError::EmptyOwner(s.to_string()));
        }
        if name.is_empty() {
            return Err(RepositoryIdError::EmptyName(s.to_string()));
        }

        let valid = |part: &str| {
            part.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid(owner) || !valid(name) {
            return Err(RepositoryIdError::InvalidCharacters(s.to_string()));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl Serialize for RepositoryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Latest published release of a repository.
///
/// Both fields are always non-empty; use [`ReleaseInfo::new`] to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseInfo {
    tag: String,
    artifact_url: String,
}

impl ReleaseInfo {
    /// Returns `None` when the tag or the artifact URL is blank
    pub fn new(tag: impl Into<String>, artifact_url: impl Into<String>) -> Option<Self> {
        let tag = tag.into();
        let artifact_url = artifact_url.into();

        if tag.trim().is_empty() || artifact_url.trim().is_empty() {
            return None;
        }

        Some(Self { tag, artifact_url })
    }

    /// Version identifier as published (e.g., "v1.2.0")
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Location of the downloadable package for this release
    pub fn artifact_url(&self) -> &str {
        &self.artifact_url
    }
}
