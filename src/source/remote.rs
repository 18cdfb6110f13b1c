//! GitHub REST API fetcher.
//!
//! Requests run one at a time on a private current-thread runtime. Every
//! request is bounded by the configured timeout. Fresh results are written
//! through to the cache so later cached runs see the same data.

use super::{CachedFetch, FetchResult, SourceCollaborator};
use crate::error::FetchError;
use crate::models::{Project, SourceCommit, SourceIssue};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

/// Connection settings for [`RemoteFetch`].
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// API root, e.g. `https://api.github.com`.
    pub api_url: String,
    /// Only activity at or after this instant is requested.
    pub since: DateTime<Utc>,
    /// Upper bound for each HTTP round trip.
    pub timeout: Duration,
    /// Page size for list endpoints.
    pub per_page: u32,
}

#[derive(Debug, Deserialize)]
struct CommitItem {
    sha: String,
    commit: CommitInner,
    #[serde(default)]
    author: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CommitInner {
    #[serde(default)]
    author: Option<Signature>,
    #[serde(default)]
    committer: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    #[serde(default)]
    name: Option<String>,
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    #[serde(default)]
    stats: Option<CommitStats>,
}

#[derive(Debug, Deserialize)]
struct CommitStats {
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

#[derive(Debug, Deserialize)]
struct IssueItem {
    number: u64,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pull_request: Option<Value>,
}

/// Fetches project activity from the GitHub REST API.
#[derive(Debug)]
pub struct RemoteFetch {
    config: RemoteConfig,
    http_client: reqwest::Client,
    runtime: Runtime,
    cache: CachedFetch,
}

impl RemoteFetch {
    /// Create a fetcher that writes results into `cache`.
    pub fn new(config: RemoteConfig, cache: CachedFetch) -> Result<Self, FetchError> {
        info!(
            "Remote fetch from {} since {}",
            config.api_url,
            config.since.format("%Y-%m-%d %H:%M:%S UTC")
        );

        let http_client = reqwest::Client::builder().build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(FetchError::Runtime)?;

        Ok(Self {
            config,
            http_client,
            runtime,
            cache,
        })
    }

    fn repo_url(&self, project: &Project, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            project.owner,
            project.repo,
            tail
        )
    }

    fn since_param(&self) -> String {
        self.config.since.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// GET `url` and decode the body. `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, FetchError> {
        debug!("GET {} {:?}", url, query);

        let timed_out = || FetchError::Timeout {
            url: url.to_string(),
            seconds: self.config.timeout.as_secs(),
        };

        let request = self
            .http_client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("hacktrack/", env!("CARGO_PKG_VERSION")))
            .query(query)
            .send();

        let response = tokio::time::timeout(self.config.timeout, request)
            .await
            .map_err(|_| timed_out())??;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = tokio::time::timeout(self.config.timeout, response.text())
            .await
            .map_err(|_| timed_out())??;

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| FetchError::Json {
                what: url.to_string(),
                source,
            })
    }

    /// Collect every page of a list endpoint. `Ok(None)` if the first page is 404.
    async fn get_pages<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> FetchResult<T> {
        let per_page = self.config.per_page.max(1);
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let mut paged = query.to_vec();
            paged.push(("per_page", per_page.to_string()));
            paged.push(("page", page.to_string()));

            let batch: Vec<T> = match self.get_json(url, &paged).await {
                Ok(Some(batch)) => batch,
                Ok(None) if page == 1 => return Ok(None),
                Ok(None) => break,
                // An empty repository answers 409 on the commits endpoint.
                Err(FetchError::Status { status: 409, .. }) if page == 1 => return Ok(Some(items)),
                Err(e) => return Err(e),
            };

            let received = batch.len();
            items.extend(batch);
            if received < per_page as usize {
                break;
            }
            page += 1;
        }

        Ok(Some(items))
    }

    async fn commits(&self, project: &Project) -> FetchResult<SourceCommit> {
        let url = self.repo_url(project, "commits");
        let items: Vec<CommitItem> =
            match self.get_pages(&url, &[("since", self.since_param())]).await? {
                Some(items) => items,
                None => return Ok(None),
            };

        debug!("{} commits listed for {}", items.len(), project);

        let mut commits = Vec::with_capacity(items.len());
        for item in items {
            let signature = match item.commit.author.or(item.commit.committer) {
                Some(signature) => signature,
                None => {
                    debug!("Commit {} of {} has no date, skipping", item.sha, project);
                    continue;
                }
            };

            let detail_url = self.repo_url(project, &format!("commits/{}", item.sha));
            let stats = self
                .get_json::<CommitDetail>(&detail_url, &[])
                .await?
                .and_then(|detail| detail.stats);

            // Fall back to the git signature name when the commit is not
            // linked to a GitHub account.
            let author = match item.author {
                Some(Value::Null) | None => signature.name.map(Value::String),
                other => other,
            };

            commits.push(SourceCommit {
                sha: item.sha,
                author,
                date: signature.date,
                additions: stats.as_ref().map_or(0, |s| s.additions),
                deletions: stats.as_ref().map_or(0, |s| s.deletions),
            });
        }

        Ok(Some(commits))
    }

    async fn issues(&self, project: &Project) -> FetchResult<SourceIssue> {
        let url = self.repo_url(project, "issues");
        let query = [("state", "all".to_string()), ("since", self.since_param())];
        let items: Vec<IssueItem> = match self.get_pages(&url, &query).await? {
            Some(items) => items,
            None => return Ok(None),
        };

        let issues = items
            .into_iter()
            .filter(|item| item.pull_request.is_none())
            .map(|item| SourceIssue {
                id: item.number.to_string(),
                created_at: item.created_at,
                closed_at: item.closed_at,
            })
            .collect();

        Ok(Some(issues))
    }
}

impl SourceCollaborator for RemoteFetch {
    fn fetch_commits(&self, project: &Project) -> FetchResult<SourceCommit> {
        let commits = self.runtime.block_on(self.commits(project))?;

        if let Some(ref commits) = commits {
            if let Err(e) = self.cache.store_commits(project, commits) {
                warn!("Failed to cache commits for {}: {}", project, e);
            }
        }

        Ok(commits)
    }

    fn fetch_issues(&self, project: &Project) -> FetchResult<SourceIssue> {
        let issues = self.runtime.block_on(self.issues(project))?;

        if let Some(ref issues) = issues {
            if let Err(e) = self.cache.store_issues(project, issues) {
                warn!("Failed to cache issues for {}: {}", project, e);
            }
        }

        Ok(issues)
    }
}
