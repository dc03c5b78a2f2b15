use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

/// Failure of a single latest-release fetch.
///
/// Every variant means "no release information for this cycle". Callers must
/// not read any of them as "no update available".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    /// HTTP status code when the remote answered with a non-success status
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryIdError {
    #[error("Repository must be given as owner/name: {0:?}")]
    MissingSeparator(String),

    #[error("Repository owner is empty: {0:?}")]
    EmptyOwner(String),

    #[error("Repository name is empty: {0:?}")]
    EmptyName(String),

    #[error("Repository contains invalid characters: {0:?}")]
    InvalidCharacters(String),
}
