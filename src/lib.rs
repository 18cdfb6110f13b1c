//! # Hacktrack
//!
//! Tracks commit and issue activity across the repositories taking part in
//! a hackathon.
//!
//! A run loads the project catalog, fetches each project's history through a
//! [`source::SourceCollaborator`] (local cache or the GitHub API), merges the
//! results into provenance-tagged tables and derives time-bucketed series:
//! cumulative commit counts and per-interval opened/closed issue counts.
//!
//! ## Example
//!
//! ```no_run
//! use hacktrack::analysis::{boundaries, bucket_cumulative, collect, Frequency};
//! use hacktrack::catalog::ProjectCatalog;
//! use hacktrack::source::CachedFetch;
//! use indicatif::ProgressBar;
//! use std::path::{Path, PathBuf};
//!
//! # fn main() -> anyhow::Result<()> {
//! let catalog = ProjectCatalog::load(Path::new("data/projects.csv"))?;
//! let source = CachedFetch::new(PathBuf::from("data"));
//! let collected = collect(&catalog, &source, &ProgressBar::hidden());
//!
//! let since = "2018-08-05T00:00:00Z".parse()?;
//! let now = "2018-08-08T00:00:00Z".parse()?;
//! let bounds = boundaries(since, now, &"10H".parse::<Frequency>()?)?;
//! let series = bucket_cumulative(&collected.commits, &bounds);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod source;

pub use error::{Error, FetchError, Result};
