//! Fetcher implementations for retrieving release metadata

pub mod github;

pub use github::GitHubReleaseFetcher;
