//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Project;
use clap::Parser;
use std::path::PathBuf;

/// Hacktrack - commit and issue activity for hackathon projects
///
/// Loads the tracked project list, gathers commits and issues for each
/// project (from the local cache, or fresh from GitHub with --update) and
/// prints time-bucketed activity summaries.
///
/// Examples:
///   hacktrack --projects data/projects.csv
///   hacktrack --update --since 2018-08-05
///   hacktrack --view commits-over-time --frequency 1D --format json
///   hacktrack --view snapshot -o static/data.json
///   hacktrack --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// CSV file listing tracked projects (columns: owner, repo)
    #[arg(short, long, value_name = "FILE")]
    pub projects: Option<PathBuf>,

    /// Directory holding cached project data
    #[arg(short, long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Fetch fresh data from GitHub and refresh the cache
    #[arg(long)]
    pub update: bool,

    /// Start of the event (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_name = "DATE")]
    pub since: Option<String>,

    /// Bucket width, e.g. 10H, 30min, 1D, 2W
    #[arg(long, value_name = "FREQ")]
    pub frequency: Option<String>,

    /// Observation time used as the last bucket boundary (default: now)
    #[arg(long, value_name = "TIMESTAMP")]
    pub now: Option<String>,

    /// Restrict views to these projects (OWNER/REPO, comma-separated)
    #[arg(long = "project", value_name = "OWNER/REPO", value_delimiter = ',')]
    pub project: Vec<String>,

    /// Which view to produce
    #[arg(long, default_value = "summary", value_name = "VIEW")]
    pub view: View,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Output file path (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// GitHub API root URL
    #[arg(long, value_name = "URL", env = "HACKTRACK_API_URL")]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds for --update
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .hacktrack.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .hacktrack.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Report view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum View {
    /// Commit and issue totals plus both time series
    #[default]
    Summary,
    /// Number of commits per project
    CommitsByProject,
    /// Number of commits per author
    CommitsByUser,
    /// Cumulative commits per project over time
    CommitsOverTime,
    /// Issues opened and closed per interval
    IssuesOverTime,
    /// Flat author/additions/deletions rows
    Snapshot,
}

impl View {
    /// Whether this view needs time buckets.
    pub fn uses_buckets(self) -> bool {
        matches!(
            self,
            View::Summary | View::CommitsOverTime | View::IssuesOverTime
        )
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        self.selected_projects()?;

        Ok(())
    }

    /// Returns the projects passed with --project.
    pub fn selected_projects(&self) -> Result<Vec<Project>, String> {
        self.project.iter().map(|p| p.parse::<Project>()).collect()
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::parse_from(std::iter::once("hacktrack").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.view, View::Summary);
        assert_eq!(args.format, OutputFormat::Markdown);
        assert!(!args.update);
        assert!(args.project.is_empty());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_project_selection() {
        let args = parse(&["--project", "acme/widgets,bids/watchtower"]);
        let selected = args.selected_projects().unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[1], Project::new("bids", "watchtower"));

        let args = parse(&["--project", "not-a-project"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_view_values() {
        let args = parse(&["--view", "commits-over-time", "--format", "json"]);
        assert_eq!(args.view, View::CommitsOverTime);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_views_using_buckets() {
        assert!(View::Summary.uses_buckets());
        assert!(View::IssuesOverTime.uses_buckets());
        assert!(!View::Snapshot.uses_buckets());
        assert!(!View::CommitsByUser.uses_buckets());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = parse(&["--verbose", "--quiet"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_timeout_and_url() {
        assert!(parse(&["--timeout", "0"]).validate().is_err());
        assert!(parse(&["--api-url", "ftp://example.com"]).validate().is_err());
        assert!(parse(&["--api-url", "http://localhost:8080"]).validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(parse(&[]).log_level(), tracing::Level::INFO);
        assert_eq!(parse(&["-v"]).log_level(), tracing::Level::DEBUG);
        assert_eq!(parse(&["-q"]).log_level(), tracing::Level::ERROR);
    }
}
