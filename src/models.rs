//! Data models for the activity tracker.
//!
//! This module contains the project identity types, the raw records handed
//! over by a source collaborator, the normalized provenance-tagged records,
//! and the derived bucket and report types.

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Author name used when a commit has no usable author information.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Provenance tag attached to every merged record, formatted as `owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tracked repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Project {
    pub owner: String,
    pub repo: String,
}

impl Project {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Returns the `owner/repo` identifier for this project.
    pub fn id(&self) -> ProjectId {
        ProjectId(format!("{}/{}", self.owner, self.repo))
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for Project {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(Self::new(owner, repo))
            }
            _ => Err(format!("expected OWNER/REPO, got '{}'", s)),
        }
    }
}

/// A commit as returned by a source collaborator, before normalization.
///
/// `author` keeps whatever the data source produced: a plain name, an object
/// with a `login` field, or nothing at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCommit {
    pub sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Value>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

/// An issue as returned by a source collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceIssue {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

/// A normalized commit tagged with its originating project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    /// Author login or name; [`UNKNOWN_AUTHOR`] when absent or malformed.
    pub author: String,
    pub date: DateTime<Utc>,
    pub additions: u64,
    pub deletions: u64,
    pub project: ProjectId,
}

impl CommitRecord {
    /// Builds a tagged record from a raw commit.
    ///
    /// A malformed author never fails the record: it becomes
    /// [`UNKNOWN_AUTHOR`] and the problem is returned alongside.
    pub fn from_source(source: SourceCommit, project: &ProjectId) -> (Self, Option<Error>) {
        let (author, problem) = match normalize_author(&source.sha, source.author.as_ref()) {
            Ok(Some(name)) => (name, None),
            Ok(None) => (UNKNOWN_AUTHOR.to_string(), None),
            Err(e) => (UNKNOWN_AUTHOR.to_string(), Some(e)),
        };

        let record = Self {
            sha: source.sha,
            author,
            date: source.date,
            additions: source.additions,
            deletions: source.deletions,
            project: project.clone(),
        };

        (record, problem)
    }

    pub fn has_known_author(&self) -> bool {
        self.author != UNKNOWN_AUTHOR
    }
}

/// Reduces the heterogeneous author representations to a single optional name.
pub fn normalize_author(sha: &str, raw: Option<&Value>) -> Result<Option<String>, Error> {
    let name = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(name)) => Some(name.as_str()),
        Some(Value::Object(fields)) => fields
            .get("login")
            .and_then(Value::as_str)
            .or_else(|| fields.get("name").and_then(Value::as_str)),
        Some(_) => None,
    };

    match name.map(str::trim) {
        Some("") => Ok(None),
        Some(name) => Ok(Some(name.to_string())),
        None => Err(Error::MalformedAuthorField {
            sha: sha.to_string(),
            found: raw.map(Value::to_string).unwrap_or_default(),
        }),
    }
}

/// A normalized issue tagged with its originating project.
///
/// `closed_at` absent means the issue was still open when observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub project: ProjectId,
}

impl IssueRecord {
    pub fn from_source(source: SourceIssue, project: &ProjectId) -> Self {
        Self {
            id: source.id,
            created_at: source.created_at,
            closed_at: source.closed_at,
            project: project.clone(),
        }
    }
}

/// A unified table: the projects that contributed to it, in catalog order,
/// and the concatenation of their records in the same order.
///
/// A project may appear in `projects` with no records at all; it still gets
/// an all-zero bucket series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table<R> {
    pub projects: Vec<ProjectId>,
    pub records: Vec<R>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            records: Vec::new(),
        }
    }
}

impl<R> Table<R> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub type CommitTable = Table<CommitRecord>;
pub type IssueTable = Table<IssueRecord>;

/// Series a bucket point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Cumulative commit count.
    Commits,
    /// Issues opened within an interval.
    Opened,
    /// Issues closed within an interval.
    Closed,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Commits => write!(f, "commits"),
            Metric::Opened => write!(f, "opened"),
            Metric::Closed => write!(f, "closed"),
        }
    }
}

/// One value of a bucketed series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketPoint {
    pub time: DateTime<Utc>,
    pub project: ProjectId,
    pub metric: Metric,
    pub value: u64,
}

/// Commit count for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCount {
    pub project: ProjectId,
    pub commits: usize,
}

/// Commit count for one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCount {
    pub user: String,
    pub commits: usize,
}

/// Opened/closed totals for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTotals {
    pub project: ProjectId,
    pub opened: usize,
    pub closed: usize,
}

/// Flat commit row served to the browser scatter plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSnapshot {
    pub author: String,
    pub additions: u64,
    pub deletions: u64,
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Wall-clock time the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Fetch strategy used (`cached` or `remote`).
    pub mode: String,
    /// First bucket boundary.
    pub since: DateTime<Utc>,
    /// Observation instant used for boundary generation.
    pub now: DateTime<Utc>,
    /// Bucket width as given by the user.
    pub frequency: String,
    /// Number of projects in the catalog.
    pub projects_tracked: usize,
    /// Projects skipped because no data was available.
    pub projects_skipped: Vec<String>,
}

/// One rendered view of the unified tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "view", content = "rows", rename_all = "kebab-case")]
pub enum ReportSection {
    CommitsByProject(Vec<ProjectCount>),
    CommitsByUser(Vec<UserCount>),
    IssueTotals(Vec<IssueTotals>),
    CommitsOverTime(Vec<BucketPoint>),
    IssuesOverTime(Vec<BucketPoint>),
    Snapshot(Vec<CommitSnapshot>),
}

impl ReportSection {
    /// Returns the section heading.
    pub fn title(&self) -> &'static str {
        match self {
            ReportSection::CommitsByProject(_) => "Commits by Project",
            ReportSection::CommitsByUser(_) => "Commits by User",
            ReportSection::IssueTotals(_) => "Issue Totals",
            ReportSection::CommitsOverTime(_) => "Commits over Time",
            ReportSection::IssuesOverTime(_) => "Issues over Time",
            ReportSection::Snapshot(_) => "Commit Snapshot",
        }
    }
}

/// A complete activity report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub sections: Vec<ReportSection>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn source_commit(author: Option<Value>) -> SourceCommit {
        SourceCommit {
            sha: "abc123".to_string(),
            author,
            date: Utc.with_ymd_and_hms(2018, 8, 7, 12, 0, 0).unwrap(),
            additions: 10,
            deletions: 2,
        }
    }

    #[test]
    fn test_project_id_format() {
        let project = Project::new("acme", "widgets");
        assert_eq!(project.id().as_str(), "acme/widgets");
        assert_eq!(project.to_string(), "acme/widgets");
    }

    #[test]
    fn test_project_from_str() {
        assert_eq!(
            "acme/widgets".parse::<Project>(),
            Ok(Project::new("acme", "widgets"))
        );
        assert!("acme".parse::<Project>().is_err());
        assert!("/widgets".parse::<Project>().is_err());
        assert!("a/b/c".parse::<Project>().is_err());
    }

    #[test]
    fn test_normalize_author_variants() {
        assert_eq!(normalize_author("s", None).unwrap(), None);
        assert_eq!(normalize_author("s", Some(&Value::Null)).unwrap(), None);
        assert_eq!(
            normalize_author("s", Some(&json!("octocat"))).unwrap(),
            Some("octocat".to_string())
        );
        assert_eq!(
            normalize_author("s", Some(&json!({"login": "octocat", "id": 1}))).unwrap(),
            Some("octocat".to_string())
        );
        assert_eq!(normalize_author("s", Some(&json!(""))).unwrap(), None);
    }

    #[test]
    fn test_normalize_author_malformed() {
        let err = normalize_author("abc", Some(&json!(42))).unwrap_err();
        assert!(matches!(err, Error::MalformedAuthorField { .. }));

        let err = normalize_author("abc", Some(&json!({"id": 7}))).unwrap_err();
        assert!(matches!(err, Error::MalformedAuthorField { .. }));
    }

    #[test]
    fn test_commit_record_from_source() {
        let id = Project::new("acme", "widgets").id();

        let (record, problem) = CommitRecord::from_source(source_commit(None), &id);
        assert_eq!(record.author, UNKNOWN_AUTHOR);
        assert!(!record.has_known_author());
        assert!(problem.is_none());
        assert_eq!(record.project, id);

        let (record, problem) =
            CommitRecord::from_source(source_commit(Some(json!([1, 2]))), &id);
        assert_eq!(record.author, UNKNOWN_AUTHOR);
        assert!(problem.is_some());

        let (record, _) =
            CommitRecord::from_source(source_commit(Some(json!({"login": "dev"}))), &id);
        assert_eq!(record.author, "dev");
        assert!(record.has_known_author());
    }

    #[test]
    fn test_source_commit_deserialize_defaults() {
        let commit: SourceCommit =
            serde_json::from_str(r#"{"sha": "a1", "date": "2018-08-07T10:00:00Z"}"#).unwrap();
        assert_eq!(commit.author, None);
        assert_eq!(commit.additions, 0);
        assert_eq!(commit.deletions, 0);
    }

    #[test]
    fn test_metric_serialization() {
        assert_eq!(serde_json::to_string(&Metric::Opened).unwrap(), "\"opened\"");
        assert_eq!(Metric::Commits.to_string(), "commits");
    }

    #[test]
    fn test_report_section_tagging() {
        let section = ReportSection::CommitsByUser(vec![UserCount {
            user: "dev".to_string(),
            commits: 3,
        }]);
        let value = serde_json::to_value(&section).unwrap();
        assert_eq!(value["view"], "commits-by-user");
        assert_eq!(value["rows"][0]["commits"], 3);
    }
}
