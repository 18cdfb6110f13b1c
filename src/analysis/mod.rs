//! Analysis modules.
//!
//! Aggregation of per-project data into unified tables, time bucketing of
//! those tables, and summary views for reporting.

pub mod aggregator;
pub mod bucketer;
pub mod summary;

pub use aggregator::{collect, merge, new_progress_bar, Collected, ProjectData};
pub use bucketer::{boundaries, bucket_cumulative, bucket_interval, parse_timestamp, Frequency};
pub use summary::*;
