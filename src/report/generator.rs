//! Markdown and JSON report generation.
//!
//! Bucketed series are pivoted into one row per boundary and one column per
//! project (and metric), which is the table shape chart renderers expect.

use crate::models::{
    BucketPoint, CommitSnapshot, IssueTotals, ProjectCount, Report, ReportMetadata,
    ReportSection, UserCount,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Hackathon Activity Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));

    for section in &report.sections {
        output.push_str(&format!("## {}\n\n", section.title()));
        let body = match section {
            ReportSection::CommitsByProject(rows) => project_count_table(rows),
            ReportSection::CommitsByUser(rows) => user_count_table(rows),
            ReportSection::IssueTotals(rows) => issue_totals_table(rows),
            ReportSection::CommitsOverTime(points) | ReportSection::IssuesOverTime(points) => {
                series_table(points)
            }
            ReportSection::Snapshot(rows) => snapshot_table(rows),
        };
        output.push_str(&body);
        output.push('\n');
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Source:** {}\n", metadata.mode));
    section.push_str(&format!(
        "- **Window:** {} to {}\n",
        metadata.since.format(TIME_FORMAT),
        metadata.now.format(TIME_FORMAT)
    ));
    section.push_str(&format!("- **Bucket Width:** {}\n", metadata.frequency));
    section.push_str(&format!(
        "- **Projects Tracked:** {}\n",
        metadata.projects_tracked
    ));
    if !metadata.projects_skipped.is_empty() {
        section.push_str(&format!(
            "- **Projects Without Data:** {}\n",
            metadata.projects_skipped.join(", ")
        ));
    }
    section.push('\n');

    section
}

fn project_count_table(rows: &[ProjectCount]) -> String {
    let mut table = String::from("| Project | Commits |\n|:---|---:|\n");
    for row in rows {
        table.push_str(&format!("| {} | {} |\n", row.project, row.commits));
    }
    table
}

fn user_count_table(rows: &[UserCount]) -> String {
    if rows.is_empty() {
        return "No commits with a known author.\n".to_string();
    }

    let mut table = String::from("| User | Commits |\n|:---|---:|\n");
    for row in rows {
        table.push_str(&format!("| {} | {} |\n", row.user, row.commits));
    }
    table
}

fn issue_totals_table(rows: &[IssueTotals]) -> String {
    let mut table = String::from("| Project | Opened | Closed |\n|:---|---:|---:|\n");
    for row in rows {
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            row.project, row.opened, row.closed
        ));
    }
    table
}

fn snapshot_table(rows: &[CommitSnapshot]) -> String {
    let mut table = String::from("| Author | Additions | Deletions |\n|:---|---:|---:|\n");
    for row in rows {
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            row.author, row.additions, row.deletions
        ));
    }
    table
}

/// Column headers and rows of a pivoted series.
pub type Pivot = (Vec<String>, Vec<(DateTime<Utc>, Vec<u64>)>);

/// Pivot bucket points into `time x (project, metric)` form.
///
/// Columns and rows keep first-seen order. Single-metric series use the
/// project name alone as column header.
pub fn pivot_series(points: &[BucketPoint]) -> Pivot {
    let mut column_keys = Vec::new();
    let mut column_index = HashMap::new();
    let mut row_index: HashMap<DateTime<Utc>, usize> = HashMap::new();
    let mut rows: Vec<(DateTime<Utc>, Vec<u64>)> = Vec::new();

    for point in points {
        let key = (&point.project, point.metric);
        let column = *column_index.entry(key).or_insert_with(|| {
            column_keys.push(key);
            column_keys.len() - 1
        });

        let row = *row_index.entry(point.time).or_insert_with(|| {
            rows.push((point.time, Vec::new()));
            rows.len() - 1
        });

        let values = &mut rows[row].1;
        if values.len() <= column {
            values.resize(column + 1, 0);
        }
        values[column] = point.value;
    }

    for (_, values) in &mut rows {
        values.resize(column_keys.len(), 0);
    }

    let single_metric = column_keys.windows(2).all(|w| w[0].1 == w[1].1);
    let headers = column_keys
        .iter()
        .map(|(project, metric)| {
            if single_metric {
                project.to_string()
            } else {
                format!("{} {}", project, metric)
            }
        })
        .collect();

    (headers, rows)
}

fn series_table(points: &[BucketPoint]) -> String {
    let (headers, rows) = pivot_series(points);
    if headers.is_empty() {
        return "No data in the selected window.\n".to_string();
    }

    let mut table = format!("| Time | {} |\n", headers.join(" | "));
    table.push_str(&format!("|:---|{}\n", "---:|".repeat(headers.len())));

    for (time, values) in rows {
        let cells: Vec<String> = values.iter().map(u64::to_string).collect();
        table.push_str(&format!(
            "| {} | {} |\n",
            time.format(TIME_FORMAT),
            cells.join(" | ")
        ));
    }

    table
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by hacktrack*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Generate the flat JSON array served to the browser scatter plot.
pub fn generate_snapshot_json(rows: &[CommitSnapshot]) -> Result<String> {
    serde_json::to_string(rows).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metric, Project, ProjectId};
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 8, 7, hour, 0, 0).unwrap()
    }

    fn point(project: &ProjectId, hour: u32, metric: Metric, value: u64) -> BucketPoint {
        BucketPoint {
            time: at(hour),
            project: project.clone(),
            metric,
            value,
        }
    }

    fn create_test_report() -> Report {
        let id = Project::new("acme", "widgets").id();
        Report {
            metadata: ReportMetadata {
                generated_at: at(12),
                mode: "cached".to_string(),
                since: at(0),
                now: at(10),
                frequency: "10H".to_string(),
                projects_tracked: 2,
                projects_skipped: vec!["bids/watchtower".to_string()],
            },
            sections: vec![
                ReportSection::CommitsByProject(vec![ProjectCount {
                    project: id.clone(),
                    commits: 3,
                }]),
                ReportSection::CommitsOverTime(vec![
                    point(&id, 0, Metric::Commits, 0),
                    point(&id, 10, Metric::Commits, 3),
                ]),
            ],
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_report());

        assert!(markdown.contains("# Hackathon Activity Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Commits by Project"));
        assert!(markdown.contains("| acme/widgets | 3 |"));
        assert!(markdown.contains("| 2018-08-07 10:00 | 3 |"));
        assert!(markdown.contains("Projects Without Data:** bids/watchtower"));
    }

    #[test]
    fn test_pivot_single_metric() {
        let a = Project::new("acme", "widgets").id();
        let b = Project::new("bids", "watchtower").id();
        let points = vec![
            point(&a, 0, Metric::Commits, 0),
            point(&a, 10, Metric::Commits, 2),
            point(&b, 0, Metric::Commits, 1),
            point(&b, 10, Metric::Commits, 4),
        ];

        let (headers, rows) = pivot_series(&points);
        assert_eq!(headers, vec!["acme/widgets", "bids/watchtower"]);
        assert_eq!(rows, vec![(at(0), vec![0, 1]), (at(10), vec![2, 4])]);
    }

    #[test]
    fn test_pivot_multiple_metrics() {
        let a = Project::new("acme", "widgets").id();
        let points = vec![
            point(&a, 0, Metric::Opened, 2),
            point(&a, 0, Metric::Closed, 1),
        ];

        let (headers, rows) = pivot_series(&points);
        assert_eq!(headers, vec!["acme/widgets opened", "acme/widgets closed"]);
        assert_eq!(rows, vec![(at(0), vec![2, 1])]);
    }

    #[test]
    fn test_empty_series() {
        assert!(series_table(&[]).contains("No data"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_report()).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"commits-over-time\""));
        assert!(json.contains("\"projects_skipped\""));
    }

    #[test]
    fn test_snapshot_json() {
        let rows = vec![CommitSnapshot {
            author: "dev".to_string(),
            additions: 4,
            deletions: 2,
        }];
        assert_eq!(
            generate_snapshot_json(&rows).unwrap(),
            r#"[{"author":"dev","additions":4,"deletions":2}]"#
        );
    }
}
