//! Checking and refreshing several repositories at once

use std::time::Duration;

use futures::future::join_all;
use tokio::time::sleep;
use tracing::{error, info};

use crate::config::{FETCH_STAGGER_DELAY_MS, current_timestamp_ms};
use crate::update::checker::{UpdateCheck, UpdateChecker};
use crate::version::error::FetchError;
use crate::version::types::RepositoryId;

/// Outcome of checking one repository
#[derive(Debug)]
pub struct RepositoryCheck {
    pub repository: RepositoryId,
    pub result: Result<UpdateCheck, FetchError>,
}

/// Check every repository against the same current version.
///
/// Checks run in parallel with staggered start times to avoid rate limiting.
/// Results come back in input order; one failure does not affect the others.
pub async fn check_all(
    checker: &UpdateChecker,
    repositories: &[RepositoryId],
    current_version: &str,
) -> Vec<RepositoryCheck> {
    let futures = repositories.iter().enumerate().map(|(i, repository)| {
        let delay = Duration::from_millis(FETCH_STAGGER_DELAY_MS * i as u64);
        async move {
            sleep(delay).await;
            let result = checker
                .check(repository, current_version)
                .await
                .inspect_err(|e| error!("Update check failed for {}: {}", repository, e));
            RepositoryCheck {
                repository: repository.clone(),
                result,
            }
        }
    });

    join_all(futures).await
}

/// Re-fetch every cached release that is older than the refresh interval.
///
/// Returns the repositories that were refreshed successfully.
pub async fn refresh_stale_releases(checker: &UpdateChecker) -> Vec<RepositoryId> {
    refresh_stale_releases_at(checker, current_timestamp_ms()).await
}

/// Same as [`refresh_stale_releases`] with an explicit clock reading.
///
/// A failed fetch keeps the old entry, so the next refresh retries it.
pub async fn refresh_stale_releases_at(checker: &UpdateChecker, now: i64) -> Vec<RepositoryId> {
    let Some(storer) = checker.storer() else {
        return Vec::new();
    };

    let stale = storer
        .repositories_needing_refresh(now)
        .inspect_err(|e| error!("Failed to list stale releases: {}", e))
        .unwrap_or_default();

    if stale.is_empty() {
        info!("No cached releases need refreshing");
        return Vec::new();
    }

    let futures = stale.into_iter().enumerate().map(|(i, repository)| {
        let delay = Duration::from_millis(FETCH_STAGGER_DELAY_MS * i as u64);
        async move {
            sleep(delay).await;
            match checker.fetch_and_store_at(&repository, now).await {
                Ok(release) => {
                    info!("Refreshed {}: {}", repository, release.tag());
                    Some(repository)
                }
                Err(e) => {
                    error!("Failed to refresh {}: {}", repository, e);
                    None
                }
            }
        }
    });

    join_all(futures).await.into_iter().flatten().collect()
}
