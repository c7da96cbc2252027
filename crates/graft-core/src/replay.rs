//! Replay of ungrafted source commits onto a fresh destination branch.
//!
//! The replayer only ever appends: it creates one new branch off the
//! destination head and commits onto it. Nothing is amended or rewritten,
//! and an interrupted replay is left in place for inspection. Rerunning is
//! safe because each created commit carries a graft token.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use graft_git::{ChangedFile, CommitInfo, GitOps, Oid, Person};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::context::RepoPairContext;
use crate::error::Result;
use crate::index::CandidateCommitIndex;
use crate::paths::{PathMapper, TrackedPathMap};
use crate::token::format_token;

/// Source paths that could not be mapped into the destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UnmatchedPathSet(BTreeSet<String>);

impl UnmatchedPathSet {
    /// Record a miss.
    pub fn insert(&mut self, path: impl Into<String>) {
        self.0.insert(path.into());
    }

    /// Paths in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether `path` was recorded.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    /// Number of distinct paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Replayer lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayPhase {
    NotStarted,
    BranchCreated,
    Replaying,
    /// Dry run computed its plan without touching the destination.
    Planned,
    Done,
}

/// One source commit that was (or, in a dry run, would be) replayed.
#[derive(Debug, Clone)]
pub struct GraftRecord {
    /// The replayed source commit.
    pub source: CommitInfo,
    /// Commit created in the destination; `None` in a dry run.
    pub created: Option<Oid>,
    /// Destination paths written.
    pub files: Vec<String>,
}

/// Result of a replay.
#[derive(Debug, Clone, Default)]
pub struct ReplayOutcome {
    /// Branch the grafts were committed to; `None` in a dry run.
    pub branch: Option<String>,
    /// Replayed commits, oldest first.
    pub grafted: Vec<GraftRecord>,
    /// Eligible commits with no mappable file, or whose changes the
    /// destination already holds.
    pub skipped: Vec<CommitInfo>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

/// Replays eligible entries of a [`CandidateCommitIndex`] onto the destination.
pub struct GraftReplayer<'a, G: GitOps> {
    source: &'a G,
    destination: &'a G,
    paths: &'a TrackedPathMap,
    mapper: PathMapper<'a>,
    branch_prefix: String,
    dry_run: bool,
    phase: ReplayPhase,
}

impl<'a, G: GitOps> GraftReplayer<'a, G> {
    /// Create a replayer for a validated pair.
    ///
    /// # Errors
    /// Returns `BareRepository` if the destination has no working tree.
    pub fn new(
        ctx: &'a RepoPairContext<G>,
        branch_prefix: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let root = ctx
            .destination_root()
            .ok_or(graft_git::Error::BareRepository)?;

        Ok(Self {
            source: ctx.source(),
            destination: ctx.destination(),
            paths: ctx.paths(),
            mapper: PathMapper::new(ctx.paths(), root),
            branch_prefix: branch_prefix.into(),
            dry_run,
            phase: ReplayPhase::NotStarted,
        })
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> ReplayPhase {
        self.phase
    }

    /// Replay every eligible entry, recording mapping misses in `unmatched`.
    ///
    /// # Errors
    /// Propagates git and filesystem errors; commits created before the
    /// failure stay on the branch.
    pub fn run(
        &mut self,
        index: &CandidateCommitIndex,
        unmatched: &mut UnmatchedPathSet,
    ) -> Result<ReplayOutcome> {
        let mut outcome = ReplayOutcome {
            dry_run: self.dry_run,
            ..ReplayOutcome::default()
        };

        if self.dry_run {
            self.phase = ReplayPhase::Planned;
        } else {
            let name = self.unique_branch_name(Local::now());
            self.destination.create_branch(&name)?;
            self.destination.checkout(&name)?;
            info!(branch = %name, "created graft branch");
            outcome.branch = Some(name);
            self.phase = ReplayPhase::BranchCreated;
        }

        for commit in replay_order(index) {
            if !self.dry_run {
                self.phase = ReplayPhase::Replaying;
            }

            let changed = self.source.changed_files(commit.id)?;
            let mapped = self.map_files(&changed, unmatched);
            if mapped.is_empty() {
                warn!(commit = %commit.short_id(), "no file maps into the destination, skipping");
                outcome.skipped.push(commit.clone());
                continue;
            }

            let created = if self.dry_run {
                debug!(commit = %commit.short_id(), files = mapped.len(), "would graft");
                None
            } else if let Some(oid) = self.apply(commit, &mapped)? {
                Some(oid)
            } else {
                outcome.skipped.push(commit.clone());
                continue;
            };

            outcome.grafted.push(GraftRecord {
                source: commit.clone(),
                created,
                files: mapped.into_iter().map(|(_, dest)| dest).collect(),
            });
        }

        self.phase = ReplayPhase::Done;
        info!(
            grafted = outcome.grafted.len(),
            skipped = outcome.skipped.len(),
            dry_run = self.dry_run,
            "replay finished"
        );
        Ok(outcome)
    }

    /// Filter a commit's files through the replay predicate and map them.
    fn map_files<'f>(
        &self,
        changed: &'f [ChangedFile],
        unmatched: &mut UnmatchedPathSet,
    ) -> Vec<(&'f ChangedFile, String)> {
        let mut mapped = Vec::new();
        for file in changed.iter().filter(|f| self.paths.is_replayable(&f.path)) {
            if let Some(dest) = self.mapper.map(&file.path) {
                mapped.push((file, dest));
            } else {
                debug!(path = %file.path, "unmapped source path");
                unmatched.insert(file.path.clone());
            }
        }
        mapped
    }

    /// Write and stage the mapped files, then commit. Returns `None` without
    /// committing when the destination already holds every change.
    fn apply(
        &self,
        commit: &CommitInfo,
        mapped: &[(&ChangedFile, String)],
    ) -> Result<Option<Oid>> {
        let mut staged = Vec::with_capacity(mapped.len());
        for (file, dest) in mapped {
            let content = file
                .blob
                .map(|blob| self.source.blob_content(blob))
                .transpose()?;
            self.destination
                .write_worktree_file(dest, content.as_deref())?;
            staged.push(dest.clone());
        }

        self.destination.stage_paths(&staged)?;
        if !self.destination.has_staged_changes()? {
            warn!(commit = %commit.short_id(), "destination already has these changes, skipping");
            return Ok(None);
        }

        let oid = self
            .destination
            .commit_staged(&graft_message(commit), &commit.author)?;

        info!(source = %commit.short_id(), created = %oid, "grafted commit");
        Ok(Some(oid))
    }

    fn unique_branch_name(&self, now: DateTime<Local>) -> String {
        let base = format!("{}-{}", self.branch_prefix, now.format("%Y%m%d%H%M%S"));
        if !self.destination.branch_exists(&base) {
            return base;
        }

        let mut n = 1;
        loop {
            let candidate = format!("{base}-{n}");
            if !self.destination.branch_exists(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Eligible source commits, oldest first.
///
/// Sorted on committer time rather than relying on walk direction; the
/// reversal first keeps topological order among equal timestamps.
fn replay_order(index: &CandidateCommitIndex) -> Vec<&CommitInfo> {
    let mut commits: Vec<&CommitInfo> = index
        .eligible()
        .filter_map(|e| e.source_commit.as_ref())
        .collect();
    commits.reverse();
    commits.sort_by_key(|c| c.committer.time);
    commits
}

/// Message for a graft commit: subject, token, then the original metadata.
#[must_use]
pub fn graft_message(commit: &CommitInfo) -> String {
    let id = commit.id.to_string();
    let mut msg = String::new();

    let subject = commit.summary();
    msg.push_str(if subject.is_empty() { "(no subject)" } else { subject });
    msg.push_str("\n\n");
    msg.push_str(&format_token(&id));
    msg.push_str("\n\n");

    let _ = writeln!(msg, "Grafted-from: {id}");
    let _ = writeln!(msg, "Author:     {}", identity(&commit.author));
    let _ = writeln!(msg, "AuthorDate: {}", format_date(&commit.author));
    let _ = writeln!(msg, "Commit:     {}", identity(&commit.committer));
    let _ = writeln!(msg, "CommitDate: {}", format_date(&commit.committer));
    msg.push('\n');

    for line in commit.message.trim_end().lines() {
        if line.is_empty() {
            msg.push('\n');
        } else {
            let _ = writeln!(msg, "    {line}");
        }
    }

    msg
}

fn identity(person: &Person) -> String {
    format!("{} <{}>", person.name, person.email)
}

fn format_date(person: &Person) -> String {
    let offset = FixedOffset::east_opt(person.offset_minutes * 60).unwrap_or_else(|| Utc.fix());
    DateTime::from_timestamp(person.time, 0).map_or_else(
        || person.time.to_string(),
        |utc| utc.with_timezone(&offset).to_rfc2822(),
    )
}
