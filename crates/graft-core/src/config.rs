//! Configuration management for graft.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::paths::TrackedPathMap;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "graft.toml";

/// Graft configuration loaded from `graft.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Repository commits are read from.
    #[serde(default)]
    pub source: RepoConfig,

    /// Repository commits are replayed into.
    #[serde(default)]
    pub destination: RepoConfig,

    /// Engine settings.
    #[serde(default)]
    pub graft: GraftConfig,
}

impl Config {
    /// Load config from a TOML file.
    ///
    /// Relative repository paths are resolved against the file's directory.
    ///
    /// # Errors
    /// Returns error if the file is missing or can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingConfig(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.source.path = base.join(&config.source.path);
        config.destination.path = base.join(&config.destination.path);
        Ok(config)
    }

    /// Build the tracked-path map from the `tracked_paths` lines and ignore lists.
    ///
    /// # Errors
    /// Returns `InvalidTrackedPath` for a malformed line.
    pub fn tracked_paths(&self) -> Result<TrackedPathMap> {
        TrackedPathMap::parse(
            &self.graft.tracked_paths,
            &self.source.ignore,
            &self.destination.ignore,
        )
    }
}

/// Location and branch of one side of the pair.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoConfig {
    /// Path to the working tree.
    #[serde(default = "default_repo_path")]
    pub path: PathBuf,

    /// Branch to read from or graft onto.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Prefixes excluded even when nested under a tracked prefix.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            path: default_repo_path(),
            branch: default_branch(),
            ignore: Vec::new(),
        }
    }
}

fn default_repo_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_branch() -> String {
    "main".into()
}

/// Engine settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GraftConfig {
    /// How far back, in days, both histories are walked.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Prefix of created branch names.
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,

    /// `source-prefix > destination-prefix` lines.
    #[serde(default)]
    pub tracked_paths: Vec<String>,

    /// Committer emails of automated merge identities to exclude.
    #[serde(default = "default_merge_bot_emails")]
    pub merge_bot_emails: Vec<String>,
}

impl Default for GraftConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            branch_prefix: default_branch_prefix(),
            tracked_paths: Vec::new(),
            merge_bot_emails: default_merge_bot_emails(),
        }
    }
}

const fn default_lookback_days() -> u32 {
    30
}

fn default_branch_prefix() -> String {
    "graft".into()
}

fn default_merge_bot_emails() -> Vec<String> {
    vec!["noreply@github.com".into()]
}
