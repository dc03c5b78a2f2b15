//! Update decision layer
//!
//! Combines a [`ReleaseFetcher`](crate::version::fetcher::ReleaseFetcher) with an
//! optional release cache and the loose version comparator to answer
//! "is there an update?" for one or many repositories.
//!
//! # Modules
//!
//! - [`checker`]: Cached update check for one repository and the storer trait
//! - [`refresh`]: Parallel checks and stale cache refresh
//! - [`subjects`]: Classification of installed subjects (current / outdated)
//! - [`report`]: Plain-text table rendering

pub mod checker;
pub mod refresh;
pub mod report;
pub mod subjects;
