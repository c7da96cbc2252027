//! Repository pair validation.
//!
//! Every precondition is checked before any history walk or mutation, and
//! all violations are reported together so a single run surfaces every
//! problem with the configuration.

use std::path::Path;

use graft_git::GitOps;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::paths::TrackedPathMap;

/// Which repository of the pair something belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Destination => f.write_str("destination"),
        }
    }
}

/// A validated source/destination repository pair.
///
/// Immutable once constructed; both requested branches are checked out.
#[derive(Debug)]
pub struct RepoPairContext<G: GitOps> {
    source: G,
    destination: G,
    source_branch: String,
    destination_branch: String,
    paths: TrackedPathMap,
}

impl<G: GitOps> RepoPairContext<G> {
    /// Validate the pair and check out the requested branches.
    ///
    /// # Errors
    /// Returns `Configuration` listing every violation found. Errors from the
    /// git layer while checking out a valid branch are propagated as-is.
    pub fn new(
        source: G,
        source_branch: impl Into<String>,
        destination: G,
        destination_branch: impl Into<String>,
        paths: TrackedPathMap,
    ) -> Result<Self> {
        let ctx = Self {
            source,
            destination,
            source_branch: source_branch.into(),
            destination_branch: destination_branch.into(),
            paths,
        };

        let mut violations = Vec::new();

        if ctx.paths.is_empty() {
            violations.push("no tracked paths configured".to_string());
        }

        for side in [Side::Source, Side::Destination] {
            let repo_ok = ctx.check_repository(side, &mut violations)?;
            if repo_ok {
                debug!(%side, branch = ctx.branch(side), "checking out requested branch");
                ctx.repo(side).checkout(ctx.branch(side))?;
            }
            ctx.check_paths(side, &mut violations);
        }

        if !violations.is_empty() {
            return Err(Error::Configuration { violations });
        }

        info!(
            source_branch = %ctx.source_branch,
            destination_branch = %ctx.destination_branch,
            rules = ctx.paths.rules().len(),
            "repository pair validated"
        );
        Ok(ctx)
    }

    /// Repository-level checks; returns whether the branch can be checked out.
    fn check_repository(&self, side: Side, violations: &mut Vec<String>) -> Result<bool> {
        let repo = self.repo(side);
        let branch = self.branch(side);
        let before = violations.len();

        if repo.workdir().is_none() {
            violations.push(format!("{side}: repository has no working tree"));
            return Ok(false);
        }

        if repo.is_empty()? {
            violations.push(format!("{side}: repository is empty"));
            return Ok(false);
        }

        if !repo.is_clean()? {
            violations.push(format!("{side}: working tree has uncommitted changes"));
        }

        if branch == "HEAD" {
            violations.push(format!(
                "{side}: branch '{branch}' is a detached HEAD, name a local branch"
            ));
        } else if !repo.is_valid_branch_name(branch) {
            violations.push(format!("{side}: '{branch}' is not a valid branch name"));
        } else if !repo.branch_exists(branch) {
            if repo.remote_branch_exists(branch) {
                violations.push(format!(
                    "{side}: branch '{branch}' only exists on a remote, create a local branch"
                ));
            } else {
                violations.push(format!("{side}: branch '{branch}' does not exist"));
            }
        }

        Ok(violations.len() == before)
    }

    fn check_paths(&self, side: Side, violations: &mut Vec<String>) {
        let Some(root) = self.repo(side).workdir() else {
            return;
        };

        let (tracked, ignored): (Vec<&str>, &[String]) = match side {
            Side::Source => (
                self.paths.rules().iter().map(|r| r.source.as_str()).collect(),
                self.paths.source_ignore(),
            ),
            Side::Destination => (
                self.paths
                    .rules()
                    .iter()
                    .map(|r| r.destination.as_str())
                    .collect(),
                self.paths.destination_ignore(),
            ),
        };

        for path in tracked {
            if !root.join(path).exists() {
                violations.push(format!("{side}: tracked path '{path}' does not exist"));
            }
        }
        for path in ignored {
            if !root.join(path).exists() {
                violations.push(format!("{side}: ignore path '{path}' does not exist"));
            }
        }
    }

    /// Repository handle for a side.
    #[must_use]
    pub const fn repo(&self, side: Side) -> &G {
        match side {
            Side::Source => &self.source,
            Side::Destination => &self.destination,
        }
    }

    /// Requested branch for a side.
    #[must_use]
    pub fn branch(&self, side: Side) -> &str {
        match side {
            Side::Source => &self.source_branch,
            Side::Destination => &self.destination_branch,
        }
    }

    /// The source repository.
    #[must_use]
    pub const fn source(&self) -> &G {
        &self.source
    }

    /// The destination repository.
    #[must_use]
    pub const fn destination(&self) -> &G {
        &self.destination
    }

    /// Tracked-path configuration.
    #[must_use]
    pub const fn paths(&self) -> &TrackedPathMap {
        &self.paths
    }

    /// Destination working tree root.
    #[must_use]
    pub fn destination_root(&self) -> Option<&Path> {
        self.destination.workdir()
    }
}
