//! Per-project fetching and merging into unified tables.
//!
//! Every project in the catalog is fetched independently. A project that
//! yields no commits or no issues is skipped for both tables; a fetch
//! failure is treated the same way, so one bad project never aborts the
//! batch.

use crate::catalog::ProjectCatalog;
use crate::error::Error;
use crate::models::{
    CommitRecord, CommitTable, IssueRecord, IssueTable, Project, SourceCommit, SourceIssue,
};
use crate::source::{FetchResult, SourceCollaborator};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

/// Raw data fetched for one project.
#[derive(Debug, Clone)]
pub struct ProjectData {
    pub project: Project,
    pub commits: Vec<SourceCommit>,
    pub issues: Vec<SourceIssue>,
}

/// Output of a collection run.
#[derive(Debug, Default)]
pub struct Collected {
    /// All commits, in catalog order.
    pub commits: CommitTable,
    /// All issues, in catalog order.
    pub issues: IssueTable,
    /// One `ProjectUnavailable` per skipped project.
    pub skipped: Vec<Error>,
    /// One `MalformedAuthorField` per commit whose author was normalized away.
    pub author_problems: Vec<Error>,
}

impl Collected {
    /// Identifiers of the projects that were skipped.
    pub fn skipped_projects(&self) -> Vec<String> {
        self.skipped
            .iter()
            .filter_map(|e| match e {
                Error::ProjectUnavailable { project, .. } => Some(project.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Create the catalog progress bar. Hidden when `visible` is false.
pub fn new_progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Fetch every catalog project from `source` and merge the results.
pub fn collect<S>(catalog: &ProjectCatalog, source: &S, progress: &ProgressBar) -> Collected
where
    S: SourceCollaborator + ?Sized,
{
    let mut fetched = Vec::with_capacity(catalog.len());
    let mut skipped = Vec::new();

    for project in catalog {
        progress.set_message(project.to_string());
        info!("Getting commit and issue information for {}", project);

        match fetch_project(source, project) {
            Ok(data) => fetched.push(data),
            Err(e) => {
                warn!("Skipping {}", e);
                skipped.push(e);
            }
        }

        progress.inc(1);
    }

    progress.finish_and_clear();

    let mut collected = merge(fetched);
    collected.skipped = skipped;

    info!(
        "Collected {} commits and {} issues from {} projects ({} skipped)",
        collected.commits.len(),
        collected.issues.len(),
        collected.commits.projects.len(),
        collected.skipped.len()
    );

    collected
}

/// Fetch both record sets for one project.
///
/// Returns `ProjectUnavailable` if either set is missing or failed.
pub fn fetch_project<S>(source: &S, project: &Project) -> Result<ProjectData, Error>
where
    S: SourceCollaborator + ?Sized,
{
    let commits = source.fetch_commits(project);
    let issues = source.fetch_issues(project);

    let unavailable = |reason: String| Error::ProjectUnavailable {
        project: project.id().to_string(),
        reason,
    };

    let commits = available(commits, "commits").map_err(unavailable)?;
    let issues = available(issues, "issues").map_err(unavailable)?;

    Ok(ProjectData {
        project: project.clone(),
        commits,
        issues,
    })
}

fn available<T>(result: FetchResult<T>, what: &str) -> Result<Vec<T>, String> {
    match result {
        Ok(Some(records)) => Ok(records),
        Ok(None) => Err(format!("no {} data", what)),
        Err(e) => Err(format!("fetching {} failed: {}", what, e)),
    }
}

/// Tag and concatenate per-project record sets, preserving their order.
///
/// No deduplication is done: a record returned twice is kept twice.
pub fn merge(fetched: Vec<ProjectData>) -> Collected {
    let commit_total: usize = fetched.iter().map(|d| d.commits.len()).sum();
    let issue_total: usize = fetched.iter().map(|d| d.issues.len()).sum();

    let mut collected = Collected::default();
    collected.commits.records.reserve(commit_total);
    collected.issues.records.reserve(issue_total);

    for data in fetched {
        let id = data.project.id();
        let mut malformed = 0usize;

        for commit in data.commits {
            let (record, problem) = CommitRecord::from_source(commit, &id);
            if let Some(problem) = problem {
                debug!("{}", problem);
                malformed += 1;
                collected.author_problems.push(problem);
            }
            collected.commits.records.push(record);
        }

        if malformed > 0 {
            warn!("{} commits of {} had a malformed author", malformed, id);
        }

        collected.issues.records.extend(
            data.issues
                .into_iter()
                .map(|issue| IssueRecord::from_source(issue, &id)),
        );

        collected.commits.projects.push(id.clone());
        collected.issues.projects.push(id);
    }

    collected
}
