//! Error types for the tracking pipeline.
//!
//! Catalog and bucketing errors are fatal for the call that raised them.
//! Per-project fetch failures and per-record author problems are absorbed
//! by the aggregator, which keeps them only for reporting.

use std::path::PathBuf;

/// Result alias used throughout the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the pipeline core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The project list lacks a required column.
    #[error("project list {path} is missing required column(s): {missing}")]
    CatalogFormat { path: PathBuf, missing: String },

    /// The project list could not be read or a row could not be decoded.
    #[error("failed to read project list {path}: {source}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A project produced no data and was skipped.
    #[error("project {project} unavailable: {reason}")]
    ProjectUnavailable { project: String, reason: String },

    /// Author data was present but had an unexpected shape.
    #[error("malformed author field on commit {sha}: {found}")]
    MalformedAuthorField { sha: String, found: String },

    /// Invalid since/now/frequency combination.
    #[error("invalid bucketing parameters: {0}")]
    Bucketing(String),
}

/// Failures reported by a source collaborator.
///
/// The aggregator never propagates these; they turn into a skipped project.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("invalid JSON in {what}: {source}")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("failed to start async runtime: {0}")]
    Runtime(std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_format_message() {
        let err = Error::CatalogFormat {
            path: PathBuf::from("projects.csv"),
            missing: "owner".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "project list projects.csv is missing required column(s): owner"
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = FetchError::Timeout {
            url: "https://api.github.com/repos/a/b/commits".to_string(),
            seconds: 5,
        };
        assert!(err.to_string().contains("timed out after 5s"));
    }
}
