//! Command-line front end

use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::{CheckerConfig, data_dir, db_path};
use crate::update::checker::{UpdateCheck, UpdateChecker};
use crate::update::refresh::{check_all, refresh_stale_releases};
use crate::update::report::render_table;
use crate::update::subjects::{Subject, classify_subjects};
use crate::version::cache::Cache;
use crate::version::checker::compare_versions;
use crate::version::error::FetchError;
use crate::version::registries::GitHubReleaseFetcher;
use crate::version::types::RepositoryId;

#[derive(Debug, Parser)]
#[command(name = "release-check")]
#[command(version, about = "Checks the latest GitHub release of a repository")]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// GitHub API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// How long a fetched release stays fresh, in milliseconds
    #[arg(long, global = true)]
    pub refresh_interval_ms: Option<i64>,

    /// Release cache database file
    #[arg(long, global = true)]
    pub cache_db: Option<PathBuf>,

    /// Always fetch from the network
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the latest release of a repository
    Latest { repository: RepositoryId },

    /// Compare two version strings
    Compare { current: String, latest: String },

    /// Check repositories for a release newer than the current version
    Check {
        #[arg(required = true)]
        repositories: Vec<RepositoryId>,

        /// Locally installed version
        #[arg(long)]
        current: String,

        /// Ignore cached releases
        #[arg(long)]
        force: bool,
    },

    /// Print a version table for subjects listed in a JSON file
    Report {
        /// JSON array of {name, currentVersion, latestVersion?}
        path: PathBuf,

        /// Repository whose latest release applies to the subject named by --name
        #[arg(long, requires = "name")]
        repository: Option<RepositoryId>,

        /// Subject that is distributed through --repository
        #[arg(long, requires = "repository")]
        name: Option<String>,
    },

    /// Re-fetch every cached release older than the refresh interval
    Refresh,
}

/// Entry of a report input file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportEntry {
    #[serde(flatten)]
    subject: Subject,
    latest_version: Option<String>,
}

impl Cli {
    /// Configuration from the optional file, overridden by command-line flags
    pub fn resolve_config(&self) -> anyhow::Result<CheckerConfig> {
        let mut config = match &self.config {
            Some(path) => CheckerConfig::load(path)?,
            None => CheckerConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.fetch.base_url = base_url.clone();
        }
        if let Some(timeout) = self.timeout_ms {
            config.fetch.timeout = timeout;
        }
        if let Some(interval) = self.refresh_interval_ms {
            config.cache.refresh_interval = interval;
        }
        if let Some(path) = &self.cache_db {
            config.cache.path = Some(path.clone());
        }
        if self.no_cache {
            config.cache.enabled = false;
        }

        Ok(config)
    }
}

/// Build the update checker; an unusable cache degrades to direct fetches
pub fn build_checker(config: &CheckerConfig) -> anyhow::Result<UpdateChecker> {
    let fetcher = Arc::new(GitHubReleaseFetcher::new(
        &config.fetch.base_url,
        Duration::from_millis(config.fetch.timeout),
    )?);

    if !config.cache.enabled {
        return Ok(UpdateChecker::uncached(fetcher));
    }

    let path = match &config.cache.path {
        Some(path) => path.clone(),
        None => {
            let dir = data_dir();
            if let Err(e) = std::fs::create_dir_all(&dir) {
                error!("Failed to create data directory {:?}: {}", dir, e);
                return Ok(UpdateChecker::uncached(fetcher));
            }
            db_path()
        }
    };

    match Cache::new(&path, config.cache.refresh_interval) {
        Ok(cache) => {
            info!("Cache initialized at {:?}", path);
            Ok(UpdateChecker::new(fetcher, Arc::new(cache)))
        }
        Err(e) => {
            error!("Failed to initialize cache: {}", e);
            Ok(UpdateChecker::uncached(fetcher))
        }
    }
}

/// Run a parsed command, writing its output to `out`.
///
/// Returns `Ok(false)` when the command ran but could not produce any result
/// (e.g. every update check failed).
pub async fn run(cli: Cli, out: &mut dyn Write) -> anyhow::Result<bool> {
    let config = cli.resolve_config()?;

    match &cli.command {
        Command::Compare { current, latest } => {
            compare(current, latest, cli.json, out)?;
            Ok(true)
        }
        Command::Latest { repository } => {
            let checker = build_checker(&config)?;
            let release = checker.latest_release(repository).await?;
            if cli.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&release)?)?;
            } else {
                writeln!(out, "{}", release.tag())?;
                writeln!(out, "{}", release.artifact_url())?;
            }
            Ok(true)
        }
        Command::Check {
            repositories,
            current,
            force,
        } => {
            let checker = build_checker(&config)?;
            if *force {
                for repository in repositories {
                    let _ = checker
                        .invalidate(repository)
                        .inspect_err(|e| error!("Failed to invalidate {}: {}", repository, e));
                }
            }
            let results = check_all(&checker, repositories, current).await;
            let any_succeeded = results.iter().any(|r| r.result.is_ok());

            if cli.json {
                let values: Vec<_> = results
                    .iter()
                    .map(|r| match &r.result {
                        Ok(check) => json!({ "repository": r.repository, "result": check }),
                        Err(e) => json!({ "repository": r.repository, "error": error_json(e) }),
                    })
                    .collect();
                writeln!(out, "{}", serde_json::to_string_pretty(&values)?)?;
            } else {
                for r in &results {
                    writeln!(out, "{}", describe_check(&r.repository, &r.result))?;
                }
            }
            Ok(any_succeeded)
        }
        Command::Report {
            path,
            repository,
            name,
        } => {
            let entries = read_report_entries(path)?;
            let mut latest: HashMap<String, String> = entries
                .iter()
                .filter_map(|e| {
                    e.latest_version
                        .clone()
                        .map(|v| (e.subject.name.clone(), v))
                })
                .collect();

            let mut errors = Vec::new();
            if let (Some(repository), Some(name)) = (repository, name) {
                let checker = build_checker(&config)?;
                match checker.latest_release(repository).await {
                    Ok(release) => {
                        latest.insert(name.clone(), release.tag().to_string());
                    }
                    Err(e) => {
                        warn!("Latest release of {} unavailable: {}", repository, e);
                        if cli.json {
                            errors.push(json!({
                                "subject": name,
                                "repository": repository,
                                "error": error_json(&e),
                            }));
                        } else {
                            writeln!(out, "{}: update status unknown: {}", name, e)?;
                        }
                    }
                }
            }

            let subjects: Vec<Subject> = entries.into_iter().map(|e| e.subject).collect();
            let reports = classify_subjects(&subjects, |s| latest.get(&s.name).cloned());

            if cli.json {
                let value = json!({ "reports": reports, "errors": errors });
                writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
            } else {
                write!(out, "{}", render_table(&reports))?;
            }
            Ok(true)
        }
        Command::Refresh => {
            let checker = build_checker(&config)?;
            let refreshed = refresh_stale_releases(&checker).await;
            if cli.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&refreshed)?)?;
            } else {
                for repository in &refreshed {
                    writeln!(out, "refreshed {}", repository)?;
                }
            }
            Ok(true)
        }
    }
}

fn compare(current: &str, latest: &str, as_json: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    let result = compare_versions(current, latest);
    let ordering = match result.ordering {
        Ordering::Less => "less",
        Ordering::Equal => "equal",
        Ordering::Greater => "greater",
    };

    if as_json {
        let value = json!({
            "ordering": ordering,
            "updateAvailable": result.update_available,
            "status": result.status(),
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        writeln!(
            out,
            "{} -> {}: {} ({})",
            current,
            latest,
            ordering,
            result.status().as_str()
        )?;
    }
    Ok(())
}

fn read_report_entries(path: &Path) -> anyhow::Result<Vec<ReportEntry>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {:?}: {}", path, e))?;
    let entries = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("invalid subjects file {:?}: {}", path, e))?;
    Ok(entries)
}

fn describe_check(repository: &RepositoryId, result: &Result<UpdateCheck, FetchError>) -> String {
    match result {
        Ok(UpdateCheck::Available(offer)) => format!(
            "{}: update available {} -> {} ({})",
            repository, offer.current_version, offer.new_version, offer.package_url
        ),
        Ok(UpdateCheck::UpToDate {
            current_version,
            latest_version,
        }) => format!(
            "{}: up to date (current {}, latest {})",
            repository, current_version, latest_version
        ),
        Err(e) => format!("{}: update status unknown: {}", repository, e),
    }
}

fn error_json(error: &FetchError) -> serde_json::Value {
    let kind = match error {
        FetchError::Client(_) => "client",
        FetchError::Network(_) => "network",
        FetchError::Http { .. } => "http",
        FetchError::MalformedResponse(_) => "malformed_response",
    };
    json!({
        "kind": kind,
        "status": error.status(),
        "message": error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    async fn run_args(args: &[&str]) -> (anyhow::Result<bool>, String) {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        let result = run(cli, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn compare_prints_ordering_and_status() {
        let (result, out) = run_args(&["release-check", "compare", "1.0.0", "1.0.1"]).await;

        assert!(result.unwrap());
        assert_eq!(out, "1.0.0 -> 1.0.1: less (outdated)\n");
    }

    #[tokio::test]
    async fn compare_json_reports_update_available() {
        let (_, out) =
            run_args(&["release-check", "--json", "compare", "2.0", "1.9.9"]).await;

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            value,
            json!({"ordering": "greater", "updateAvailable": false, "status": "current"})
        );
    }

    #[test]
    fn resolve_config_applies_flag_overrides() {
        let cli = Cli::try_parse_from([
            "release-check",
            "--base-url",
            "http://localhost:1234",
            "--timeout-ms",
            "500",
            "--refresh-interval-ms",
            "60000",
            "--no-cache",
            "refresh",
        ])
        .unwrap();

        let config = cli.resolve_config().unwrap();

        assert_eq!(config.fetch.base_url, "http://localhost:1234");
        assert_eq!(config.fetch.timeout, 500);
        assert_eq!(config.cache.refresh_interval, 60000);
        assert!(!config.cache.enabled);
    }

    #[test]
    fn check_requires_valid_repository() {
        let result =
            Cli::try_parse_from(["release-check", "check", "not-a-repo", "--current", "1.0.0"]);

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn check_prints_one_line_per_repository() {
        let mut server = Server::new_async().await;
        let _found = server
            .mock("GET", "/repos/spalmeida/verificador/releases/latest")
            .with_status(200)
            .with_body(r#"{"tag_name": "v1.1.0", "zipball_url": "https://example.com/v1.1.0.zip"}"#)
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/repos/gone/repo/releases/latest")
            .with_status(404)
            .create_async()
            .await;
        let url = server.url();

        let (result, out) = run_args(&[
            "release-check",
            "--no-cache",
            "--base-url",
            url.as_str(),
            "check",
            "spalmeida/verificador",
            "gone/repo",
            "--current",
            "1.0.0",
        ])
        .await;

        assert!(result.unwrap());
        assert_eq!(
            out,
            "spalmeida/verificador: update available 1.0.0 -> v1.1.0 (https://example.com/v1.1.0.zip)\n\
             gone/repo: update status unknown: HTTP error: status 404\n"
        );
    }

    #[tokio::test]
    async fn check_fails_when_every_repository_fails() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/gone/repo/releases/latest")
            .with_status(404)
            .create_async()
            .await;
        let url = server.url();

        let (result, out) = run_args(&[
            "release-check",
            "--no-cache",
            "--json",
            "--base-url",
            url.as_str(),
            "check",
            "gone/repo",
            "--current",
            "1.0.0",
        ])
        .await;

        assert!(!result.unwrap());
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["repository"], "gone/repo");
        assert_eq!(value[0]["error"]["kind"], "http");
        assert_eq!(value[0]["error"]["status"], 404);
    }

    #[tokio::test]
    async fn report_renders_table_and_survives_failed_fetch() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/spalmeida/verificador/releases/latest")
            .with_status(500)
            .create_async()
            .await;
        let url = server.url();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"name": "Akismet", "currentVersion": "5.0", "latestVersion": "5.3.1"}},
                {{"name": "Verificador", "currentVersion": "1.0.0"}}
            ]"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let (result, out) = run_args(&[
            "release-check",
            "--no-cache",
            "--base-url",
            url.as_str(),
            "report",
            path.as_str(),
            "--repository",
            "spalmeida/verificador",
            "--name",
            "Verificador",
        ])
        .await;

        assert!(result.unwrap());
        assert_eq!(
            out,
            "\
Verificador: update status unknown: HTTP error: status 500
Name         Current  Latest  Status
-----------  -------  ------  ----------
Akismet      5.0      5.3.1   outdated !
Verificador  1.0.0    1.0.0   current
"
        );
    }

    #[tokio::test]
    async fn report_uses_fetched_release_for_named_subject() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/spalmeida/verificador/releases/latest")
            .with_status(200)
            .with_body(r#"{"tag_name": "1.2.0", "zipball_url": "https://example.com/1.2.0.zip"}"#)
            .create_async()
            .await;
        let url = server.url();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "Verificador", "currentVersion": "1.0.0"}}]"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let (_, out) = run_args(&[
            "release-check",
            "--no-cache",
            "--json",
            "--base-url",
            url.as_str(),
            "report",
            path.as_str(),
            "--repository",
            "spalmeida/verificador",
            "--name",
            "Verificador",
        ])
        .await;

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            value,
            json!({
                "reports": [{
                    "name": "Verificador",
                    "currentVersion": "1.0.0",
                    "latestVersion": "1.2.0",
                    "status": "outdated"
                }],
                "errors": []
            })
        );
    }

    #[tokio::test]
    async fn report_json_keeps_failed_fetch_inside_document() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/spalmeida/verificador/releases/latest")
            .with_status(500)
            .create_async()
            .await;
        let url = server.url();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "Verificador", "currentVersion": "1.0.0"}}]"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let (result, out) = run_args(&[
            "release-check",
            "--no-cache",
            "--json",
            "--base-url",
            url.as_str(),
            "report",
            path.as_str(),
            "--repository",
            "spalmeida/verificador",
            "--name",
            "Verificador",
        ])
        .await;

        assert!(result.unwrap());
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["reports"][0]["latestVersion"], "1.0.0");
        assert_eq!(value["reports"][0]["status"], "current");
        assert_eq!(
            value["errors"],
            json!([{
                "subject": "Verificador",
                "repository": "spalmeida/verificador",
                "error": {
                    "kind": "http",
                    "status": 500,
                    "message": "HTTP error: status 500"
                }
            }])
        );
    }
}
