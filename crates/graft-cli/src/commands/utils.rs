use std::path::Path;

use anyhow::{Context, Result};
use graft_core::{Config, RepoPairContext};
use graft_git::Repository;
use tracing::debug;

/// Load the config file.
pub fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Open both repositories named in `config` and validate them as a pair.
pub fn open_pair(config: &Config) -> Result<RepoPairContext<Repository>> {
    let paths = config.tracked_paths()?;

    debug!(path = %config.source.path.display(), "opening source repository");
    let source = Repository::open(&config.source.path).with_context(|| {
        format!(
            "Cannot open source repository at {}",
            config.source.path.display()
        )
    })?;

    debug!(path = %config.destination.path.display(), "opening destination repository");
    let destination = Repository::open(&config.destination.path).with_context(|| {
        format!(
            "Cannot open destination repository at {}",
            config.destination.path.display()
        )
    })?;

    Ok(RepoPairContext::new(
        source,
        config.source.branch.as_str(),
        destination,
        config.destination.branch.as_str(),
        paths,
    )?)
}
