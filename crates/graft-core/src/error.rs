//! Error types for graft-core.

use std::path::PathBuf;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in graft-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more preconditions of the repository pair failed.
    ///
    /// Raised before any history walk or branch creation.
    #[error("invalid configuration:\n{}", format_violations(.violations))]
    Configuration {
        /// Every violation found, in check order.
        violations: Vec<String>,
    },

    /// A tracked-path line is not of the form `source > destination`.
    #[error("invalid tracked path '{line}': {reason}")]
    InvalidTrackedPath {
        /// The offending line.
        line: String,
        /// Why the line was rejected.
        reason: String,
    },

    /// Config file does not exist.
    #[error("config file not found: {0}")]
    MissingConfig(PathBuf),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Git operation error.
    #[error("git error: {0}")]
    Git(#[from] graft_git::Error),
}

fn format_violations(violations: &[String]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}
