//! Release metadata and version comparison layer
//!
//! This module provides the core functionality for fetching, caching, and comparing
//! release versions of a single repository.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Fetcher   │────▶│    Cache    │◀────│   Checker   │
//! │  (network)  │     │  (storage)  │     │  (compare)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │ Registries  │                         │   Semver    │
//! │  (github)   │                         │(loose order)│
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: SQLite-based release cache with refresh interval
//! - [`checker`]: Version comparison result and display status
//! - [`fetcher`]: Fetcher trait for retrieving the latest release
//! - [`registries`]: Concrete fetcher implementations (GitHub)
//! - [`error`]: Error types for cache, fetch, and repository parsing
//! - [`semver`]: Loose dotted-numeric version ordering
//! - [`types`]: Common types like `ReleaseInfo` and `RepositoryId`

pub mod cache;
pub mod checker;
pub mod error;
pub mod fetcher;
pub mod registries;
pub mod semver;
pub mod types;
