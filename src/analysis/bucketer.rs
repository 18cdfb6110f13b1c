//! Time bucketing of unified tables.
//!
//! Boundaries are a fixed-width sequence from `since` up to and including
//! `now`. Commit activity is reported cumulatively at each boundary; issue
//! activity is reported per half-open interval between consecutive
//! boundaries.

use crate::error::{Error, Result};
use crate::models::{BucketPoint, CommitTable, IssueTable, Metric, ProjectId};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Upper bound on generated boundaries, to catch runaway frequencies.
pub const MAX_BOUNDARIES: usize = 100_000;

/// Bucket width, written as a count and a unit: `10H`, `30min`, `1D`.
///
/// Units: `S` seconds, `T`/`min` minutes, `H` hours, `D` days, `W` weeks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frequency {
    step: Duration,
    label: String,
}

impl Frequency {
    pub fn step(&self) -> Duration {
        self.step
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let label = s.trim();
        let split = label
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(label.len());
        let (count, unit) = label.split_at(split);

        // A bare unit means one of it, as in "H" or "D".
        let count: i64 = if count.is_empty() {
            1
        } else {
            count
                .parse()
                .map_err(|_| Error::Bucketing(format!("invalid frequency '{}'", s)))?
        };

        let step = match unit {
            "S" | "s" => Duration::try_seconds(count),
            "T" | "min" => Duration::try_minutes(count),
            "H" | "h" => Duration::try_hours(count),
            "D" | "d" => Duration::try_days(count),
            "W" | "w" => Duration::try_weeks(count),
            _ => {
                return Err(Error::Bucketing(format!(
                    "invalid frequency '{}': unknown unit '{}'",
                    s, unit
                )))
            }
        }
        .ok_or_else(|| Error::Bucketing(format!("frequency '{}' is out of range", s)))?;

        if step <= Duration::zero() {
            return Err(Error::Bucketing(format!("frequency '{}' must be positive", s)));
        }

        Ok(Self {
            step,
            label: label.to_string(),
        })
    }
}

/// Parse an instant given as RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD` (UTC).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
        .ok_or_else(|| Error::Bucketing(format!("invalid date '{}'", s)))
}

/// Generate `since, since + step, ...` up to and including `now`.
pub fn boundaries(
    since: DateTime<Utc>,
    now: DateTime<Utc>,
    frequency: &Frequency,
) -> Result<Vec<DateTime<Utc>>> {
    if since > now {
        return Err(Error::Bucketing(format!(
            "since {} is after the observation time {}",
            since.to_rfc3339(),
            now.to_rfc3339()
        )));
    }

    let span = (now - since).num_seconds();
    let step = frequency.step().num_seconds().max(1);
    let count = usize::try_from(span / step)
        .ok()
        .and_then(|n| n.checked_add(1))
        .filter(|&n| n <= MAX_BOUNDARIES)
        .ok_or_else(|| {
            Error::Bucketing(format!(
                "frequency {} yields more than {} buckets",
                frequency, MAX_BOUNDARIES
            ))
        })?;

    let mut result = Vec::with_capacity(count);
    let mut next = Some(since);
    // A step past the representable range cannot land at or before `now`.
    while let Some(current) = next.filter(|&t| t <= now) {
        result.push(current);
        next = current.checked_add_signed(frequency.step());
    }

    Ok(result)
}

/// Sorted timestamps per listed project.
fn timestamps_by_project<'a, I>(
    projects: &'a [ProjectId],
    entries: I,
) -> HashMap<&'a ProjectId, Vec<DateTime<Utc>>>
where
    I: Iterator<Item = (&'a ProjectId, DateTime<Utc>)>,
{
    let mut grouped: HashMap<&ProjectId, Vec<DateTime<Utc>>> =
        projects.iter().map(|p| (p, Vec::new())).collect();

    for (project, ts) in entries {
        if let Some(list) = grouped.get_mut(project) {
            list.push(ts);
        }
    }

    for list in grouped.values_mut() {
        list.sort_unstable();
    }

    grouped
}

/// Number of sorted timestamps strictly before `t`.
fn count_before(sorted: &[DateTime<Utc>], t: DateTime<Utc>) -> u64 {
    sorted.partition_point(|ts| *ts < t) as u64
}

/// Cumulative commit counts: at boundary `d`, commits with `date < d`.
///
/// Every project of the table gets a full series, even with no commits.
pub fn bucket_cumulative(table: &CommitTable, boundaries: &[DateTime<Utc>]) -> Vec<BucketPoint> {
    let grouped = timestamps_by_project(
        &table.projects,
        table.records.iter().map(|c| (&c.project, c.date)),
    );

    let mut points = Vec::with_capacity(table.projects.len() * boundaries.len());
    for project in &table.projects {
        let dates = grouped.get(project).map(Vec::as_slice).unwrap_or_default();
        points.extend(boundaries.iter().map(|&time| BucketPoint {
            time,
            project: project.clone(),
            metric: Metric::Commits,
            value: count_before(dates, time),
        }));
    }

    points
}

/// Per-interval issue counts over `[low, high)` for consecutive boundaries.
///
/// Each interval yields an `opened` and a `closed` point stamped with `low`.
/// Timestamps at or after the last boundary fall in no interval, so when
/// `now` is not itself a boundary the tail `[last, now]` is not counted.
pub fn bucket_interval(table: &IssueTable, boundaries: &[DateTime<Utc>]) -> Vec<BucketPoint> {
    let created = timestamps_by_project(
        &table.projects,
        table
            .records
            .iter()
            .filter_map(|i| i.created_at.map(|ts| (&i.project, ts))),
    );
    let closed = timestamps_by_project(
        &table.projects,
        table
            .records
            .iter()
            .filter_map(|i| i.closed_at.map(|ts| (&i.project, ts))),
    );

    let intervals = boundaries.len().saturating_sub(1);
    let mut points = Vec::with_capacity(table.projects.len() * intervals * 2);

    for project in &table.projects {
        let created = created.get(project).map(Vec::as_slice).unwrap_or_default();
        let closed = closed.get(project).map(Vec::as_slice).unwrap_or_default();

        for window in boundaries.windows(2) {
            let (low, high) = (window[0], window[1]);
            for (metric, stamps) in [(Metric::Opened, created), (Metric::Closed, closed)] {
                points.push(BucketPoint {
                    time: low,
                    project: project.clone(),
                    metric,
                    value: count_before(stamps, high) - count_before(stamps, low),
                });
            }
        }
    }

    points
}
