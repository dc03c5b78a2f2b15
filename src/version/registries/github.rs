//! GitHub Releases API fetcher implementation

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_BASE_URL, DEFAULT_FETCH_TIMEOUT_MS};
use crate::version::error::FetchError;
use crate::version::fetcher::ReleaseFetcher;
use crate::version::types::{ReleaseInfo, RepositoryId};

/// Response from GitHub "latest release" API. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: Option<String>,
    zipball_url: Option<String>,
}

/// Fetcher implementation for GitHub Releases API
pub struct GitHubReleaseFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubReleaseFetcher {
    /// Creates a new GitHubReleaseFetcher with a custom base URL and request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a fetcher for the public GitHub API with the default timeout
    pub fn github() -> Result<Self, FetchError> {
        Self::new(
            DEFAULT_BASE_URL,
            Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
        )
    }
}

fn parse_latest_release(body: &str) -> Result<ReleaseInfo, FetchError> {
    let release: LatestRelease = serde_json::from_str(body)
        .map_err(|e| FetchError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let tag = release
        .tag_name
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| FetchError::MalformedResponse("missing tag_name".to_string()))?;

    let artifact_url = release
        .zipball_url
        .ok_or_else(|| FetchError::MalformedResponse("missing zipball_url".to_string()))?;

    ReleaseInfo::new(tag, artifact_url)
        .ok_or_else(|| FetchError::MalformedResponse("empty zipball_url".to_string()))
}

#[async_trait::async_trait]
impl ReleaseFetcher for GitHubReleaseFetcher {
    async fn fetch_latest_release(
        &self,
        repository: &RepositoryId,
    ) -> Result<ReleaseInfo, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.base_url,
            repository.owner(),
            repository.name()
        );
        debug!("Fetching latest release: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .inspect_err(|e| warn!("Request to {} failed: {}", url, e))?;

        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            match retry_after {
                Some(secs) => warn!(
                    "GitHub API returned status {} for {} (retry after {}s)",
                    status, repository, secs
                ),
                None => warn!("GitHub API returned status {} for {}", status, repository),
            }
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let release = parse_latest_release(&body).inspect_err(|e| {
            warn!("Failed to parse latest release of {}: {}", repository, e);
        })?;

        info!("Latest release of {} is {}", repository, release.tag());
        Ok(release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use rstest::rstest;

    fn fetcher(server: &Server) -> GitHubReleaseFetcher {
        GitHubReleaseFetcher::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    fn repo() -> RepositoryId {
        "spalmeida/verificador".parse().unwrap()
    }

    #[tokio::test]
    async fn fetch_latest_release_returns_tag_and_zipball_url() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/spalmeida/verificador/releases/latest")
            .match_header("accept", "application/vnd.github+json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "tag_name": "v1.1.0",
                    "name": "Release 1.1.0",
                    "prerelease": false,
                    "zipball_url": "https://api.github.com/repos/spalmeida/verificador/zipball/v1.1.0",
                    "assets": []
                }"#,
            )
            .create_async()
            .await;

        let result = fetcher(&server)
            .fetch_latest_release(&repo())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.tag(), "v1.1.0");
        assert_eq!(
            result.artifact_url(),
            "https://api.github.com/repos/spalmeida/verificador/zipball/v1.1.0"
        );
    }

    #[tokio::test]
    async fn fetch_latest_release_returns_http_error_for_not_found() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/spalmeida/verificador/releases/latest")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let result = fetcher(&server).fetch_latest_release(&repo()).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::Http { status: 404 })));
    }

    #[tokio::test]
    async fn fetch_latest_release_returns_http_error_for_rate_limit() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/spalmeida/verificador/releases/latest")
            .with_status(429)
            .with_header("retry-after", "60")
            .with_body(r#"{"message": "API rate limit exceeded"}"#)
            .create_async()
            .await;

        let result = fetcher(&server).fetch_latest_release(&repo()).await;

        mock.assert_async().await;
        assert_eq!(result.unwrap_err().status(), Some(429));
    }

    #[rstest]
    #[case(r#"{"zipball_url": "https://example.com/a.zip"}"#)]
    #[case(r#"{"tag_name": "", "zipball_url": "https://example.com/a.zip"}"#)]
    #[case(r#"{"tag_name": null, "zipball_url": "https://example.com/a.zip"}"#)]
    #[case(r#"{"tag_name": "v1.0.0"}"#)]
    #[case(r#"{"tag_name": "v1.0.0", "zipball_url": ""}"#)]
    #[case(r#"{"tag_name": 100, "zipball_url": "https://example.com/a.zip"}"#)]
    #[case("<html>Service Unavailable</html>")]
    #[tokio::test]
    async fn fetch_latest_release_returns_malformed_response(#[case] body: &str) {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/spalmeida/verificador/releases/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let result = fetcher(&server).fetch_latest_release(&repo()).await;

        mock.assert_async().await;
        assert!(
            matches!(result, Err(FetchError::MalformedResponse(_))),
            "{result:?}"
        );
    }

    #[tokio::test]
    async fn fetch_latest_release_returns_network_error_when_unreachable() {
        // Nothing listens on port 9 of localhost
        let fetcher =
            GitHubReleaseFetcher::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

        let result = fetcher.fetch_latest_release(&repo()).await;

        assert!(matches!(result, Err(FetchError::Network(_))));
    }

    #[tokio::test]
    async fn fetch_latest_release_returns_network_error_on_timeout() {
        // Accepts the connection and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let fetcher =
            GitHubReleaseFetcher::new(&format!("http://{}", addr), Duration::from_millis(50))
                .unwrap();

        let result = fetcher.fetch_latest_release(&repo()).await;

        assert!(
            matches!(&result, Err(FetchError::Network(e)) if e.is_timeout()),
            "{result:?}"
        );
    }
}
