//! End-to-end pipeline: unified tables to bucketed series and report views.

use crate::analysis::{
    boundaries, bucket_cumulative, bucket_interval, commit_snapshot, commits_by_project,
    commits_by_user, filter_projects, issue_totals, Collected, Frequency,
};
use crate::cli::View;
use crate::error::Result;
use crate::models::{
    BucketPoint, CommitTable, IssueTable, ProjectId, Report, ReportMetadata, ReportSection,
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Bucketing parameters for one run. `now` is injected, never read here.
#[derive(Debug, Clone)]
pub struct BucketParams {
    pub since: DateTime<Utc>,
    pub now: DateTime<Utc>,
    pub frequency: Frequency,
}

impl BucketParams {
    /// Check that the parameters yield a usable boundary sequence.
    pub fn validate(&self) -> Result<()> {
        boundaries(self.since, self.now, &self.frequency).map(|_| ())
    }
}

/// Commit and issue series over the same boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub boundaries: Vec<DateTime<Utc>>,
    pub commits: Vec<BucketPoint>,
    pub issues: Vec<BucketPoint>,
}

/// Bucket both tables. Fails only on invalid parameters.
pub fn bucket_tables(
    commits: &CommitTable,
    issues: &IssueTable,
    params: &BucketParams,
) -> Result<Series> {
    let boundaries = boundaries(params.since, params.now, &params.frequency)?;
    debug!(
        "{} bucket boundaries from {} every {}",
        boundaries.len(),
        params.since,
        params.frequency
    );

    Ok(Series {
        commits: bucket_cumulative(commits, &boundaries),
        issues: bucket_interval(issues, &boundaries),
        boundaries,
    })
}

/// Options describing what to report.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub view: View,
    pub mode: String,
    pub projects_tracked: usize,
    /// Restrict views to these projects; empty means all.
    pub selection: Vec<ProjectId>,
    pub params: BucketParams,
}

/// Build the report sections for `options.view` from collected tables.
pub fn build_report(collected: &Collected, options: &ReportOptions) -> Result<Report> {
    let commits = filter_projects(&collected.commits, &options.selection, |c| &c.project);
    let issues = filter_projects(&collected.issues, &options.selection, |i| &i.project);

    let sections = match options.view {
        View::Summary => {
            let series = bucket_tables(&commits, &issues, &options.params)?;
            vec![
                ReportSection::CommitsByProject(commits_by_project(&commits)),
                ReportSection::CommitsByUser(commits_by_user(&commits)),
                ReportSection::IssueTotals(issue_totals(&issues)),
                ReportSection::CommitsOverTime(series.commits),
                ReportSection::IssuesOverTime(series.issues),
            ]
        }
        View::CommitsByProject => {
            vec![ReportSection::CommitsByProject(commits_by_project(&commits))]
        }
        View::CommitsByUser => vec![ReportSection::CommitsByUser(commits_by_user(&commits))],
        View::CommitsOverTime => {
            let series = bucket_tables(&commits, &issues, &options.params)?;
            vec![ReportSection::CommitsOverTime(series.commits)]
        }
        View::IssuesOverTime => {
            let series = bucket_tables(&commits, &issues, &options.params)?;
            vec![ReportSection::IssuesOverTime(series.issues)]
        }
        View::Snapshot => vec![ReportSection::Snapshot(commit_snapshot(&commits))],
    };

    Ok(Report {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            mode: options.mode.clone(),
            since: options.params.since,
            now: options.params.now,
            frequency: options.params.frequency.to_string(),
            projects_tracked: options.projects_tracked,
            projects_skipped: collected.skipped_projects(),
        },
        sections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{CommitRecord, Metric, Project, Table};

    fn params(since: &str, now: &str) -> BucketParams {
        BucketParams {
            since: since.parse().unwrap(),
            now: now.parse().unwrap(),
            frequency: "1D".parse().unwrap(),
        }
    }

    fn collected() -> Collected {
        let id = Project::new("acme", "widgets").id();
        Collected {
            commits: Table {
                projects: vec![id.clone()],
                records: vec![CommitRecord {
                    sha: "a".to_string(),
                    author: "dev".to_string(),
                    date: "2018-08-06T12:00:00Z".parse().unwrap(),
                    additions: 1,
                    deletions: 1,
                    project: id.clone(),
                }],
            },
            issues: Table {
                projects: vec![id],
                records: vec![],
            },
            ..Collected::default()
        }
    }

    fn options(view: View, params: BucketParams) -> ReportOptions {
        ReportOptions {
            view,
            mode: "cached".to_string(),
            projects_tracked: 1,
            selection: vec![],
            params,
        }
    }

    #[test]
    fn test_bucket_tables() {
        let collected = collected();
        let series = bucket_tables(
            &collected.commits,
            &collected.issues,
            &params("2018-08-05T00:00:00Z", "2018-08-08T00:00:00Z"),
        )
        .unwrap();

        assert_eq!(series.boundaries.len(), 4);
        let values: Vec<u64> = series.commits.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![0, 0, 1, 1]);
        assert_eq!(series.issues.len(), 6);
        assert!(series.issues.iter().all(|p| p.metric != Metric::Commits));
    }

    #[test]
    fn test_params_validate() {
        assert!(params("2018-08-05T00:00:00Z", "2018-08-08T00:00:00Z")
            .validate()
            .is_ok());
        assert!(matches!(
            params("2018-08-09T00:00:00Z", "2018-08-08T00:00:00Z").validate(),
            Err(Error::Bucketing(_))
        ));
    }

    #[test]
    fn test_summary_report_sections() {
        let report = build_report(
            &collected(),
            &options(
                View::Summary,
                params("2018-08-05T00:00:00Z", "2018-08-08T00:00:00Z"),
            ),
        )
        .unwrap();
        assert_eq!(report.sections.len(), 5);
        assert_eq!(report.metadata.frequency, "1D");
    }

    #[test]
    fn test_bucketing_error_leaves_tables_intact() {
        let collected = collected();
        let inverted = params("2018-08-09T00:00:00Z", "2018-08-08T00:00:00Z");

        let result = build_report(&collected, &options(View::CommitsOverTime, inverted.clone()));
        assert!(matches!(result, Err(Error::Bucketing(_))));
        assert_eq!(collected.commits.len(), 1);

        // Views that need no boundaries still work.
        let report = build_report(&collected, &options(View::Snapshot, inverted)).unwrap();
        assert_eq!(report.sections.len(), 1);
    }
}
