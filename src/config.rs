//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.hacktrack.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the current directory.
pub const CONFIG_FILE: &str = ".hacktrack.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Data source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Bucketing settings.
    #[serde(default)]
    pub buckets: BucketConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// CSV file listing the tracked projects.
    #[serde(default = "default_project_list")]
    pub project_list: PathBuf,

    /// Directory holding cached project data.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            project_list: default_project_list(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_project_list() -> PathBuf {
    PathBuf::from("data/projects.csv")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Query the remote API instead of reading the cache.
    #[serde(default)]
    pub update: bool,

    /// Start of the event (`YYYY-MM-DD` or RFC 3339).
    #[serde(default = "default_since")]
    pub since: String,

    /// GitHub API root.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Page size for list endpoints.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            update: false,
            since: default_since(),
            api_url: default_api_url(),
            timeout_seconds: default_timeout(),
            per_page: default_per_page(),
        }
    }
}

fn default_since() -> String {
    "2018-08-05".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_per_page() -> u32 {
    100 // GitHub maximum
}

/// Bucketing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Bucket width, e.g. `10H` or `1D`.
    #[serde(default = "default_frequency")]
    pub frequency: String,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
        }
    }
}

fn default_frequency() -> String {
    "10H".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref projects) = args.projects {
            self.general.project_list = projects.clone();
        }
        if let Some(ref data_dir) = args.data_dir {
            self.general.data_dir = data_dir.clone();
        }

        if args.update {
            self.source.update = true;
        }
        if let Some(ref since) = args.since {
            self.source.since = since.clone();
        }
        if let Some(ref api_url) = args.api_url {
            self.source.api_url = api_url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }

        if let Some(ref frequency) = args.frequency {
            self.buckets.frequency = frequency.clone();
        }
    }

    /// Validate the merged configuration.
    ///
    /// File values bypass the CLI checks, so the same limits are enforced here.
    pub fn validate(&self) -> Result<()> {
        if self.source.timeout_seconds == 0 {
            bail!("source.timeout_seconds must be at least 1");
        }
        if !(1..=100).contains(&self.source.per_page) {
            bail!(
                "source.per_page must be between 1 and 100, got {}",
                self.source.per_page
            );
        }
        let url = &self.source.api_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            bail!("source.api_url must start with 'http://' or 'https://'");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
