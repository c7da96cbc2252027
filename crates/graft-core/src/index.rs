//! Cross-repository commit correlation.
//!
//! Both histories are walked within the lookback window and every relevant
//! commit is filed under its [`CommitDigest`]. Destination commits are
//! walked first so that source commits can be matched against them, either
//! by digest or by the graft token a previous run left behind.

use std::collections::HashMap;

use graft_git::{CommitInfo, GitOps};
use tracing::{debug, info};

use crate::context::{RepoPairContext, Side};
use crate::digest::CommitDigest;
use crate::error::Result;
use crate::token::find_tokens;

/// A correlation table row: one per distinct digest.
#[derive(Debug, Clone)]
pub struct CandidateCommitEntry {
    /// Shared identity of the change.
    pub digest: CommitDigest,
    /// The commit in the source repository, if seen.
    pub source_commit: Option<CommitInfo>,
    /// The commit in the destination repository, if seen or grafted earlier.
    pub destination_commit: Option<CommitInfo>,
}

impl CandidateCommitEntry {
    /// Present in the source only: not yet replayed.
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        self.source_commit.is_some() && self.destination_commit.is_none()
    }
}

/// Parameters of the history walks.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Lower bound on commit time, seconds since epoch; `None` walks everything.
    pub since: Option<i64>,
    /// Committer emails whose commits are skipped.
    pub merge_bot_emails: Vec<String>,
    /// Local destination branches with this prefix followed by `-` are walked
    /// alongside the destination branch.
    pub branch_prefix: String,
}

/// Insertion-ordered, digest-keyed correlation table.
#[derive(Debug, Default)]
pub struct CandidateCommitIndex {
    entries: Vec<CandidateCommitEntry>,
    by_digest: HashMap<CommitDigest, usize>,
}

impl CandidateCommitIndex {
    /// Walk both histories and build the table.
    ///
    /// # Errors
    /// Propagates git errors from either repository.
    pub fn build<G: GitOps>(ctx: &RepoPairContext<G>, options: &IndexOptions) -> Result<Self> {
        let mut index = Self::default();
        let grafted = index.index_destination(ctx, options)?;
        index.index_source(ctx, options, &grafted)?;

        info!(
            entries = index.entries.len(),
            eligible = index.eligible().count(),
            "correlation table built"
        );
        Ok(index)
    }

    /// Destination pass. Returns `source id -> destination commit` for every
    /// graft token seen in the window, including each token of a squash.
    fn index_destination<G: GitOps>(
        &mut self,
        ctx: &RepoPairContext<G>,
        options: &IndexOptions,
    ) -> Result<HashMap<String, CommitInfo>> {
        let repo = ctx.destination();
        let branch = ctx.branch(Side::Destination);

        let mut tips = vec![repo.branch_commit(branch)?];
        let graft_prefix = format!("{}-", options.branch_prefix);
        for name in repo.list_branches()? {
            if name != branch && name.starts_with(&graft_prefix) {
                debug!(branch = %name, "including earlier graft branch");
                tips.push(repo.branch_commit(&name)?);
            }
        }

        let pathspecs = ctx.paths().destination_pathspecs();
        let mut grafted = HashMap::new();

        for commit in repo.walk_history(&tips, options.since)? {
            for source_id in find_tokens(&commit.message) {
                debug!(commit = %commit.short_id(), %source_id, "found graft token");
                grafted.entry(source_id).or_insert_with(|| commit.clone());
            }

            if !Self::qualifies(repo, &commit, &pathspecs, options, |p| {
                ctx.paths().is_destination_candidate(p)
            })? {
                continue;
            }

            let digest = CommitDigest::of(&commit);
            let slot = self.entry_mut(digest);
            if slot.destination_commit.is_none() {
                slot.destination_commit = Some(commit);
            }
        }

        Ok(grafted)
    }

    fn index_source<G: GitOps>(
        &mut self,
        ctx: &RepoPairContext<G>,
        options: &IndexOptions,
        grafted: &HashMap<String, CommitInfo>,
    ) -> Result<()> {
        let repo = ctx.source();
        let tip = repo.branch_commit(ctx.branch(Side::Source))?;
        let pathspecs = ctx.paths().source_pathspecs();

        for commit in repo.walk_history(&[tip], options.since)? {
            if !Self::qualifies(repo, &commit, &pathspecs, options, |p| {
                ctx.paths().is_source_candidate(p)
            })? {
                continue;
            }

            let digest = CommitDigest::of(&commit);
            let token_match = grafted.get(&commit.id.to_string()).cloned();
            let slot = self.entry_mut(digest);

            if slot.source_commit.is_some() {
                debug!(commit = %commit.short_id(), "duplicate digest in source history");
                continue;
            }
            if slot.destination_commit.is_none() {
                slot.destination_commit = token_match;
            }
            slot.source_commit = Some(commit);
        }

        Ok(())
    }

    /// Shared exclusion rules and the tracked-path gate.
    ///
    /// Accepts as soon as one changed file matches; the rest of the commit's
    /// files are only examined at replay time.
    fn qualifies<G: GitOps>(
        repo: &G,
        commit: &CommitInfo,
        pathspecs: &[String],
        options: &IndexOptions,
        is_candidate: impl Fn(&str) -> bool,
    ) -> Result<bool> {
        if commit.is_root() {
            debug!(commit = %commit.short_id(), "skipping root commit");
            return Ok(false);
        }

        if is_merge_bot(&commit.committer.email, &options.merge_bot_emails) {
            debug!(commit = %commit.short_id(), "skipping automated merge commit");
            return Ok(false);
        }

        let touched = repo.touched_paths(commit.id, pathspecs)?;
        Ok(touched.iter().any(|p| is_candidate(p)))
    }

    fn entry_mut(&mut self, digest: CommitDigest) -> &mut CandidateCommitEntry {
        let idx = match self.by_digest.get(&digest) {
            Some(&idx) => idx,
            None => {
                let idx = self.entries.len();
                self.by_digest.insert(digest.clone(), idx);
                self.entries.push(CandidateCommitEntry {
                    digest,
                    source_commit: None,
                    destination_commit: None,
                });
                idx
            }
        };
        &mut self.entries[idx]
    }

    /// Entries in discovery order.
    #[must_use]
    pub fn entries(&self) -> &[CandidateCommitEntry] {
        &self.entries
    }

    /// Entries present only in the source.
    pub fn eligible(&self) -> impl Iterator<Item = &CandidateCommitEntry> {
        self.entries.iter().filter(|e| e.is_eligible())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_merge_bot(email: &str, bots: &[String]) -> bool {
    bots.iter().any(|bot| bot.eq_ignore_ascii_case(email))
}
