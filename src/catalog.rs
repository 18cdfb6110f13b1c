//! Project catalog loading.
//!
//! The catalog is a CSV file with a header row and at least the `owner`
//! and `repo` columns (`user` is accepted in place of `owner`).

use crate::error::{Error, Result};
use crate::models::Project;
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const OWNER_COLUMNS: [&str; 2] = ["owner", "user"];
const REPO_COLUMN: &str = "repo";

/// The fixed list of tracked projects for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectCatalog {
    projects: Vec<Project>,
}

impl ProjectCatalog {
    /// Creates a catalog from an explicit list, dropping duplicates.
    pub fn new(projects: impl IntoIterator<Item = Project>) -> Self {
        let mut seen = HashSet::new();
        let projects = projects
            .into_iter()
            .filter(|p| {
                let fresh = seen.insert(p.clone());
                if !fresh {
                    warn!("Duplicate project {} ignored", p);
                }
                fresh
            })
            .collect();
        Self { projects }
    }

    /// Load the catalog from a CSV file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading project list from {}", path.display());

        let reader = csv::Reader::from_path(path).map_err(|source| Error::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_csv(reader, path)
    }

    /// Load the catalog from any CSV reader. `origin` is used in error messages.
    pub fn from_reader<R: Read>(reader: R, origin: &Path) -> Result<Self> {
        Self::from_csv(csv::Reader::from_reader(reader), origin)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>, origin: &Path) -> Result<Self> {
        let read_err = |source: csv::Error| Error::CatalogRead {
            path: origin.to_path_buf(),
            source,
        };

        let headers = reader.headers().map_err(read_err)?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let owner_idx = OWNER_COLUMNS.iter().find_map(|&name| column(name));
        let repo_idx = column(REPO_COLUMN);

        let (owner_idx, repo_idx) = match (owner_idx, repo_idx) {
            (Some(o), Some(r)) => (o, r),
            (o, r) => {
                let mut missing = Vec::new();
                if o.is_none() {
                    missing.push("owner");
                }
                if r.is_none() {
                    missing.push(REPO_COLUMN);
                }
                return Err(Error::CatalogFormat {
                    path: PathBuf::from(origin),
                    missing: missing.join(", "),
                });
            }
        };

        let mut projects = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(read_err)?;
            let owner = record.get(owner_idx).unwrap_or("").trim();
            let repo = record.get(repo_idx).unwrap_or("").trim();

            if owner.is_empty() || repo.is_empty() {
                warn!("Skipping row {} of {}: empty owner or repo", row + 2, origin.display());
                continue;
            }

            projects.push(Project::new(owner, repo));
        }

        let catalog = Self::new(projects);
        debug!("Loaded {} projects", catalog.len());
        Ok(catalog)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Project> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

impl<'a> IntoIterator for &'a ProjectCatalog {
    type Item = &'a Project;
    type IntoIter = std::slice::Iter<'a, Project>;

    fn into_iter(self) -> Self::IntoIter {
        self.projects.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ProjectCatalog> {
        ProjectCatalog::from_reader(content.as_bytes(), Path::new("projects.csv"))
    }

    #[test]
    fn test_load_preserves_source_order() {
        let catalog = parse("owner,repo\nacme,widgets\nbids,watchtower\nacme,gadgets\n").unwrap();
        let ids: Vec<String> = catalog.iter().map(|p| p.id().to_string()).collect();
        assert_eq!(ids, vec!["acme/widgets", "bids/watchtower", "acme/gadgets"]);
    }

    #[test]
    fn test_user_column_alias_and_extra_columns() {
        let catalog = parse("name,user,repo\nWidgets,acme,widgets\n").unwrap();
        assert_eq!(catalog.projects(), &[Project::new("acme", "widgets")]);
    }

    #[test]
    fn test_missing_columns() {
        let err = parse("owner,name\nacme,widgets\n").unwrap_err();
        match err {
            Error::CatalogFormat { missing, .. } => assert_eq!(missing, "repo"),
            other => panic!("unexpected error: {other}"),
        }

        let err = parse("project\nacme/widgets\n").unwrap_err();
        match err {
            Error::CatalogFormat { missing, .. } => assert_eq!(missing, "owner, repo"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicates_and_blank_rows_dropped() {
        let catalog = parse("owner,repo\nacme,widgets\n,lonely\nacme,widgets\n").unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_header_only() {
        let catalog = parse("owner,repo\n").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = ProjectCatalog::load(Path::new("/nonexistent/projects.csv")).unwrap_err();
        assert!(matches!(err, Error::CatalogRead { .. }));
    }
}
