//! Fetcher trait for retrieving the latest release of a repository

#[cfg(test)]
use mockall::automock;

use crate::version::error::FetchError;
use crate::version::types::{ReleaseInfo, RepositoryId};

/// Trait for fetching the latest published release from a remote source
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReleaseFetcher: Send + Sync {
    /// Fetches the latest release of a repository
    ///
    /// Issues exactly one request and never retries.
    ///
    /// # Arguments
    /// * `repository` - The repository to check (e.g., "spalmeida/verificador")
    ///
    /// # Returns
    /// * `Ok(ReleaseInfo)` - Tag and artifact URL of the latest release
    /// * `Err(FetchError)` - Network, HTTP status, or malformed body failure
    async fn fetch_latest_release(
        &self,
        repository: &RepositoryId,
    ) -> Result<ReleaseInfo, FetchError>;
}
