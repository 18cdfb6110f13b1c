//! Summary views over the unified tables.

use crate::models::{
    CommitSnapshot, CommitTable, IssueTable, IssueTotals, ProjectCount, ProjectId, Table,
    UserCount,
};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Keep only the selected projects. An empty selection keeps everything.
pub fn filter_projects<R, F>(table: &Table<R>, selection: &[ProjectId], project_of: F) -> Table<R>
where
    R: Clone,
    F: Fn(&R) -> &ProjectId,
{
    if selection.is_empty() {
        return table.clone();
    }

    let wanted: HashSet<&ProjectId> = selection.iter().collect();
    Table {
        projects: table
            .projects
            .iter()
            .filter(|p| wanted.contains(p))
            .cloned()
            .collect(),
        records: table
            .records
            .iter()
            .filter(|&r| wanted.contains(project_of(r)))
            .cloned()
            .collect(),
    }
}

/// Commit count per project, in table order. Projects without commits count zero.
pub fn commits_by_project(table: &CommitTable) -> Vec<ProjectCount> {
    let mut counts: HashMap<&ProjectId, usize> = HashMap::new();
    for commit in &table.records {
        *counts.entry(&commit.project).or_default() += 1;
    }

    table
        .projects
        .iter()
        .map(|project| ProjectCount {
            project: project.clone(),
            commits: counts.get(project).copied().unwrap_or(0),
        })
        .collect()
}

/// Commit count per known author, sorted by author name.
pub fn commits_by_user(table: &CommitTable) -> Vec<UserCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for commit in table.records.iter().filter(|c| c.has_known_author()) {
        *counts.entry(commit.author.as_str()).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(user, commits)| UserCount {
            user: user.to_string(),
            commits,
        })
        .collect()
}

/// Total opened and closed issues per project, in table order.
pub fn issue_totals(table: &IssueTable) -> Vec<IssueTotals> {
    let mut totals: HashMap<&ProjectId, (usize, usize)> = HashMap::new();
    for issue in &table.records {
        let entry = totals.entry(&issue.project).or_default();
        entry.0 += usize::from(issue.created_at.is_some());
        entry.1 += usize::from(issue.closed_at.is_some());
    }

    table
        .projects
        .iter()
        .map(|project| {
            let (opened, closed) = totals.get(project).copied().unwrap_or_default();
            IssueTotals {
                project: project.clone(),
                opened,
                closed,
            }
        })
        .collect()
}

/// Flat author/additions/deletions rows for the browser snapshot.
pub fn commit_snapshot(table: &CommitTable) -> Vec<CommitSnapshot> {
    table
        .records
        .iter()
        .map(|c| CommitSnapshot {
            author: c.author.clone(),
            additions: c.additions,
            deletions: c.deletions,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommitRecord, IssueRecord, Project, UNKNOWN_AUTHOR};
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    fn ts() -> DateTime<Utc> {
        "2018-08-07T12:00:00Z".parse().unwrap()
    }

    fn commit(project: &ProjectId, author: &str, additions: u64) -> CommitRecord {
        CommitRecord {
            sha: format!("{}-{}", author, additions),
            author: author.to_string(),
            date: ts(),
            additions,
            deletions: 1,
            project: project.clone(),
        }
    }

    fn sample() -> (ProjectId, ProjectId, CommitTable) {
        let a = Project::new("acme", "widgets").id();
        let b = Project::new("bids", "watchtower").id();
        let table = Table {
            projects: vec![a.clone(), b.clone()],
            records: vec![
                commit(&a, "zoe", 3),
                commit(&a, UNKNOWN_AUTHOR, 4),
                commit(&a, "adam", 5),
                commit(&a, "zoe", 6),
            ],
        };
        (a, b, table)
    }

    #[test]
    fn test_commits_by_project_includes_zero() {
        let (a, b, table) = sample();
        assert_eq!(
            commits_by_project(&table),
            vec![
                ProjectCount { project: a, commits: 4 },
                ProjectCount { project: b, commits: 0 },
            ]
        );
    }

    #[test]
    fn test_commits_by_user_sorted_without_unknown() {
        let (_, _, table) = sample();
        let users = commits_by_user(&table);
        assert_eq!(
            users,
            vec![
                UserCount { user: "adam".to_string(), commits: 1 },
                UserCount { user: "zoe".to_string(), commits: 2 },
            ]
        );
    }

    #[test]
    fn test_filter_projects() {
        let (_, b, table) = sample();
        let filtered = filter_projects(&table, &[b.clone()], |c| &c.project);
        assert_eq!(filtered.projects, vec![b]);
        assert!(filtered.records.is_empty());

        let unfiltered = filter_projects(&table, &[], |c| &c.project);
        assert_eq!(unfiltered, table);
    }

    #[test]
    fn test_issue_totals() {
        let a = Project::new("acme", "widgets").id();
        let table = Table {
            projects: vec![a.clone()],
            records: vec![
                IssueRecord {
                    id: "1".to_string(),
                    created_at: Some(ts()),
                    closed_at: Some(ts()),
                    project: a.clone(),
                },
                IssueRecord {
                    id: "2".to_string(),
                    created_at: Some(ts()),
                    closed_at: None,
                    project: a.clone(),
                },
            ],
        };
        assert_eq!(
            issue_totals(&table),
            vec![IssueTotals { project: a, opened: 2, closed: 1 }]
        );
    }

    #[test]
    fn test_commit_snapshot_is_flat_json() {
        let (_, _, table) = sample();
        let snapshot = commit_snapshot(&table);
        assert_eq!(snapshot.len(), 4);

        let json = serde_json::to_value(&snapshot[1]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"author": "unknown", "additions": 4, "deletions": 1})
        );
    }
}
