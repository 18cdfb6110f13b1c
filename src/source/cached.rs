//! On-disk cache of fetched project data.
//!
//! Layout: `<data_dir>/<owner>/<repo>/commits.json` and `issues.json`, each
//! a JSON array of raw records.

use super::{FetchResult, SourceCollaborator};
use crate::error::FetchError;
use crate::models::{Project, SourceCommit, SourceIssue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const COMMITS_FILE: &str = "commits.json";
const ISSUES_FILE: &str = "issues.json";

/// Reads (and, for the remote strategy, writes) the project cache.
#[derive(Debug, Clone)]
pub struct CachedFetch {
    data_dir: PathBuf,
}

impl CachedFetch {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn project_dir(&self, project: &Project) -> PathBuf {
        self.data_dir.join(&project.owner).join(&project.repo)
    }

    fn read<T: DeserializeOwned>(&self, project: &Project, file: &str) -> FetchResult<T> {
        let path = self.project_dir(project).join(file);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cached {} for {}", file, project);
                return Ok(None);
            }
            Err(source) => return Err(FetchError::Io { path, source }),
        };

        let records = serde_json::from_str(&content).map_err(|source| FetchError::Json {
            what: path.display().to_string(),
            source,
        })?;

        Ok(Some(records))
    }

    fn write<T: Serialize>(&self, project: &Project, file: &str, records: &[T]) -> Result<(), FetchError> {
        let dir = self.project_dir(project);
        fs::create_dir_all(&dir).map_err(|source| FetchError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(file);
        let content = serde_json::to_string_pretty(records).map_err(|source| FetchError::Json {
            what: path.display().to_string(),
            source,
        })?;

        fs::write(&path, content).map_err(|source| FetchError::Io { path, source })
    }

    /// Store the commits of `project`, replacing any cached copy.
    pub fn store_commits(&self, project: &Project, commits: &[SourceCommit]) -> Result<(), FetchError> {
        self.write(project, COMMITS_FILE, commits)
    }

    /// Store the issues of `project`, replacing any cached copy.
    pub fn store_issues(&self, project: &Project, issues: &[SourceIssue]) -> Result<(), FetchError> {
        self.write(project, ISSUES_FILE, issues)
    }
}

impl SourceCollaborator for CachedFetch {
    fn fetch_commits(&self, project: &Project) -> FetchResult<SourceCommit> {
        self.read(project, COMMITS_FILE)
    }

    fn fetch_issues(&self, project: &Project) -> FetchResult<SourceIssue> {
        self.read(project, ISSUES_FILE)
    }
}
