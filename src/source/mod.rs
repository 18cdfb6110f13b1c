//! Source collaborators that supply per-project commit and issue history.
//!
//! Two strategies exist: [`CachedFetch`] reads previously fetched data from
//! the data directory, and [`RemoteFetch`] queries the GitHub REST API and
//! refreshes the cache. Which one runs is decided by configuration.

pub mod cached;
pub mod remote;

pub use cached::CachedFetch;
pub use remote::RemoteFetch;

use crate::error::FetchError;
use crate::models::{Project, SourceCommit, SourceIssue};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of a single fetch. `Ok(None)` means no data is available.
pub type FetchResult<T> = Result<Option<Vec<T>>, FetchError>;

/// Narrow interface to the external data source.
pub trait SourceCollaborator {
    /// Commits of `project`, or `Ok(None)` when nothing is available.
    fn fetch_commits(&self, project: &Project) -> FetchResult<SourceCommit>;

    /// Issues of `project`, or `Ok(None)` when nothing is available.
    fn fetch_issues(&self, project: &Project) -> FetchResult<SourceIssue>;
}

/// How data is obtained for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Load from the on-disk cache only.
    Cached,
    /// Query the remote API for activity since the given instant.
    Remote { since: DateTime<Utc> },
}

impl FetchMode {
    pub fn name(&self) -> &'static str {
        match self {
            FetchMode::Cached => "cached",
            FetchMode::Remote { .. } => "remote",
        }
    }
}

/// Settings needed to build a [`FetchStrategy`].
#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub mode: FetchMode,
    pub data_dir: PathBuf,
    pub api_url: String,
    pub timeout: Duration,
    pub per_page: u32,
}

/// The configured fetch strategy.
#[derive(Debug)]
pub enum FetchStrategy {
    Cached(CachedFetch),
    Remote(RemoteFetch),
}

impl FetchStrategy {
    /// Build the strategy selected by `options.mode`.
    pub fn from_options(options: &SourceOptions) -> Result<Self, FetchError> {
        let cache = CachedFetch::new(options.data_dir.clone());

        match options.mode {
            FetchMode::Cached => Ok(FetchStrategy::Cached(cache)),
            FetchMode::Remote { since } => Ok(FetchStrategy::Remote(RemoteFetch::new(
                remote::RemoteConfig {
                    api_url: options.api_url.clone(),
                    since,
                    timeout: options.timeout,
                    per_page: options.per_page,
                },
                cache,
            )?)),
        }
    }

    pub fn mode_name(&self) -> &'static str {
        match self {
            FetchStrategy::Cached(_) => "cached",
            FetchStrategy::Remote(_) => "remote",
        }
    }
}

impl SourceCollaborator for FetchStrategy {
    fn fetch_commits(&self, project: &Project) -> FetchResult<SourceCommit> {
        match self {
            FetchStrategy::Cached(source) => source.fetch_commits(project),
            FetchStrategy::Remote(source) => source.fetch_commits(project),
        }
    }

    fn fetch_issues(&self, project: &Project) -> FetchResult<SourceIssue> {
        match self {
            FetchStrategy::Cached(source) => source.fetch_issues(project),
            FetchStrategy::Remote(source) => source.fetch_issues(project),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(mode: FetchMode) -> SourceOptions {
        SourceOptions {
            mode,
            data_dir: PathBuf::from("./data"),
            api_url: "https://api.github.com".to_string(),
            timeout: Duration::from_secs(5),
            per_page: 100,
        }
    }

    #[test]
    fn test_strategy_selected_by_mode() {
        let strategy = FetchStrategy::from_options(&options(FetchMode::Cached)).unwrap();
        assert_eq!(strategy.mode_name(), "cached");

        let since = "2018-08-05T00:00:00Z".parse().unwrap();
        let strategy = FetchStrategy::from_options(&options(FetchMode::Remote { since })).unwrap();
        assert_eq!(strategy.mode_name(), "remote");
    }

    #[test]
    fn test_mode_name() {
        assert_eq!(FetchMode::Cached.name(), "cached");
    }
}
