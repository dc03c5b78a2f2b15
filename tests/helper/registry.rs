//! Fetcher and cache test utilities

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use release_check::version::cache::Cache;
use release_check::version::error::FetchError;
use release_check::version::fetcher::ReleaseFetcher;
use release_check::version::types::{ReleaseInfo, RepositoryId};

/// Canned answer of the mock fetcher
#[derive(Clone)]
enum Answer {
    Release(ReleaseInfo),
    Status(u16),
    Malformed(String),
}

/// Mock fetcher for testing; counts every call
#[derive(Default)]
pub struct MockFetcher {
    answers: HashMap<String, Answer>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_release(mut self, repository: &str, tag: &str) -> Self {
        let release =
            ReleaseInfo::new(tag, format!("https://example.com/{}/{}.zip", repository, tag))
                .unwrap();
        self.answers
            .insert(repository.to_string(), Answer::Release(release));
        self
    }

    pub fn with_status(mut self, repository: &str, status: u16) -> Self {
        self.answers
            .insert(repository.to_string(), Answer::Status(status));
        self
    }

    pub fn with_malformed(mut self, repository: &str, reason: &str) -> Self {
        self.answers
            .insert(repository.to_string(), Answer::Malformed(reason.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReleaseFetcher for MockFetcher {
    async fn fetch_latest_release(
        &self,
        repository: &RepositoryId,
    ) -> Result<ReleaseInfo, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.answers.get(&repository.to_string()) {
            Some(Answer::Release(release)) => Ok(release.clone()),
            Some(Answer::Status(status)) => Err(FetchError::Http { status: *status }),
            Some(Answer::Malformed(reason)) => Err(FetchError::MalformedResponse(reason.clone())),
            None => Err(FetchError::Http { status: 404 }),
        }
    }
}

/// Create an empty test cache with the given refresh interval
pub fn create_test_cache(refresh_interval: i64) -> (TempDir, Arc<Cache>) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let cache = Cache::new(&db_path, refresh_interval).unwrap();

    (temp_dir, Arc::new(cache))
}

pub fn repo(s: &str) -> RepositoryId {
    s.parse().unwrap()
}
