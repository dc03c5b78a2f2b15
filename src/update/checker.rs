//! Cached update checking for a single repository

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::current_timestamp_ms;
use crate::version::checker::compare_versions;
use crate::version::error::{CacheError, FetchError};
use crate::version::fetcher::ReleaseFetcher;
use crate::version::types::{ReleaseInfo, RepositoryId};

/// Release together with the time it was fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRelease {
    pub release: ReleaseInfo,
    /// Milliseconds since UNIX epoch
    pub fetched_at: i64,
}

impl CachedRelease {
    /// Whether the entry is younger than `refresh_interval` at `now`
    pub fn is_fresh(&self, now: i64, refresh_interval: i64) -> bool {
        now.saturating_sub(self.fetched_at) < refresh_interval
    }
}

/// Trait for storing and retrieving fetched releases
#[cfg_attr(test, automock)]
pub trait ReleaseStorer: Send + Sync + 'static {
    /// Interval after which a stored release must be fetched again
    fn refresh_interval_ms(&self) -> i64;

    /// Get the stored release for a repository, fresh or not
    fn get_release(&self, repository: &RepositoryId) -> Result<Option<CachedRelease>, CacheError>;

    /// Get the stored release only if it is still fresh at `now`
    fn get_fresh_release(
        &self,
        repository: &RepositoryId,
        now: i64,
    ) -> Result<Option<ReleaseInfo>, CacheError> {
        let interval = self.refresh_interval_ms();
        Ok(self
            .get_release(repository)?
            .filter(|cached| cached.is_fresh(now, interval))
            .map(|cached| cached.release))
    }

    /// Store a successfully fetched release, stamped with `fetched_at`
    fn save_release(
        &self,
        repository: &RepositoryId,
        release: &ReleaseInfo,
        fetched_at: i64,
    ) -> Result<(), CacheError>;

    /// Drop the stored release; returns whether anything was removed
    fn invalidate(&self, repository: &RepositoryId) -> Result<bool, CacheError>;

    /// Repositories whose stored release is older than the refresh interval at `now`
    fn repositories_needing_refresh(&self, now: i64) -> Result<Vec<RepositoryId>, CacheError>;
}

/// Everything a host needs to offer the release as an update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOffer {
    pub repository: RepositoryId,
    pub current_version: String,
    pub new_version: String,
    /// Download link of the release package
    pub package_url: String,
    pub homepage: String,
}

/// Outcome of a successful update check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateCheck {
    /// Current version is equal to, or ahead of, the latest release
    UpToDate {
        current_version: String,
        latest_version: String,
    },
    /// A newer release exists
    Available(UpdateOffer),
}

impl UpdateCheck {
    pub fn is_update_available(&self) -> bool {
        matches!(self, UpdateCheck::Available(_))
    }

    pub fn latest_version(&self) -> &str {
        match self {
            UpdateCheck::UpToDate { latest_version, .. } => latest_version,
            UpdateCheck::Available(offer) => &offer.new_version,
        }
    }
}

/// Decide whether `release` is an update over `current_version`
pub fn decide_update(
    repository: &RepositoryId,
    current_version: &str,
    release: &ReleaseInfo,
) -> UpdateCheck {
    if compare_versions(current_version, release.tag()).update_available {
        UpdateCheck::Available(UpdateOffer {
            repository: repository.clone(),
            current_version: current_version.to_string(),
            new_version: release.tag().to_string(),
            package_url: release.artifact_url().to_string(),
            homepage: repository.homepage(),
        })
    } else {
        UpdateCheck::UpToDate {
            current_version: current_version.to_string(),
            latest_version: release.tag().to_string(),
        }
    }
}

/// Fetches latest releases through an optional cache
pub struct UpdateChecker {
    fetcher: Arc<dyn ReleaseFetcher>,
    storer: Option<Arc<dyn ReleaseStorer>>,
}

impl UpdateChecker {
    pub fn new(fetcher: Arc<dyn ReleaseFetcher>, storer: Arc<dyn ReleaseStorer>) -> Self {
        Self {
            fetcher,
            storer: Some(storer),
        }
    }

    /// Checker that always goes to the network
    pub fn uncached(fetcher: Arc<dyn ReleaseFetcher>) -> Self {
        Self {
            fetcher,
            storer: None,
        }
    }

    pub fn storer(&self) -> Option<&Arc<dyn ReleaseStorer>> {
        self.storer.as_ref()
    }

    /// Latest release of `repository`, served from cache while fresh
    pub async fn latest_release(
        &self,
        repository: &RepositoryId,
    ) -> Result<ReleaseInfo, FetchError> {
        self.latest_release_at(repository, current_timestamp_ms())
            .await
    }

    /// Same as [`Self::latest_release`] with an explicit clock reading
    pub async fn latest_release_at(
        &self,
        repository: &RepositoryId,
        now: i64,
    ) -> Result<ReleaseInfo, FetchError> {
        if let Some(storer) = &self.storer {
            let cached = storer
                .get_fresh_release(repository, now)
                .inspect_err(|e| error!("Failed to read cache for {}: {}", repository, e))
                .ok()
                .flatten();
            if let Some(release) = cached {
                debug!("Cache hit for {}: {}", repository, release.tag());
                return Ok(release);
            }
        }

        self.fetch_and_store_at(repository, now).await
    }

    /// Fetch the latest release without reading the cache and store it as
    /// fetched at `now`. A failed fetch leaves the stored entry untouched.
    pub async fn fetch_and_store_at(
        &self,
        repository: &RepositoryId,
        now: i64,
    ) -> Result<ReleaseInfo, FetchError> {
        info!("Fetching latest release for {}", repository);
        let release = self.fetcher.fetch_latest_release(repository).await?;

        if let Some(storer) = &self.storer {
            let _ = storer
                .save_release(repository, &release, now)
                .inspect_err(|e| error!("Failed to save release for {}: {}", repository, e));
        }

        Ok(release)
    }

    /// Check whether a release newer than `current_version` exists
    pub async fn check(
        &self,
        repository: &RepositoryId,
        current_version: &str,
    ) -> Result<UpdateCheck, FetchError> {
        self.check_at(repository, current_version, current_timestamp_ms())
            .await
    }

    pub async fn check_at(
        &self,
        repository: &RepositoryId,
        current_version: &str,
        now: i64,
    ) -> Result<UpdateCheck, FetchError> {
        let release = self.latest_release_at(repository, now).await?;
        Ok(decide_update(repository, current_version, &release))
    }

    /// Forget the cached release so the next check fetches again
    pub fn invalidate(&self, repository: &RepositoryId) -> Result<bool, CacheError> {
        match &self.storer {
            Some(storer) => storer.invalidate(repository),
            None => Ok(false),
        }
    }
}
