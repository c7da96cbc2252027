//! A single graft invocation.
//!
//! All per-run state (the correlation table and the unmatched paths) lives
//! on the [`GraftRun`] value, so repeated or concurrent runs in one process
//! never share anything.

use chrono::{Duration, Utc};
use graft_git::GitOps;
use tracing::info;

use crate::config::GraftConfig;
use crate::context::RepoPairContext;
use crate::error::Result;
use crate::index::{CandidateCommitIndex, IndexOptions};
use crate::replay::{GraftReplayer, ReplayOutcome, UnmatchedPathSet};
use crate::report::Report;

/// Options for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// History window in days; `None` walks full history.
    pub lookback_days: Option<u32>,
    /// Plan only, without touching the destination.
    pub dry_run: bool,
    /// Prefix for the created branch.
    pub branch_prefix: String,
    /// Committer emails of automated merge identities.
    pub merge_bot_emails: Vec<String>,
}

impl RunOptions {
    /// Options from the `[graft]` config section.
    #[must_use]
    pub fn from_config(config: &GraftConfig, dry_run: bool) -> Self {
        Self {
            lookback_days: Some(config.lookback_days),
            dry_run,
            branch_prefix: config.branch_prefix.clone(),
            merge_bot_emails: config.merge_bot_emails.clone(),
        }
    }

    fn index_options(&self) -> IndexOptions {
        IndexOptions {
            since: self
                .lookback_days
                .map(|days| (Utc::now() - Duration::days(i64::from(days))).timestamp()),
            merge_bot_emails: self.merge_bot_emails.clone(),
            branch_prefix: self.branch_prefix.clone(),
        }
    }
}

/// Owns everything a single graft run produces.
#[derive(Debug)]
pub struct GraftRun<G: GitOps> {
    ctx: RepoPairContext<G>,
    options: RunOptions,
    index: CandidateCommitIndex,
    unmatched: UnmatchedPathSet,
}

impl<G: GitOps> GraftRun<G> {
    /// Prepare a run over a validated repository pair.
    #[must_use]
    pub fn new(ctx: RepoPairContext<G>, options: RunOptions) -> Self {
        Self {
            ctx,
            options,
            index: CandidateCommitIndex::default(),
            unmatched: UnmatchedPathSet::default(),
        }
    }

    /// Index both histories, replay eligible commits and summarize.
    ///
    /// # Errors
    /// Propagates git and filesystem errors from indexing or replay.
    pub fn execute(&mut self) -> Result<Report> {
        self.index = CandidateCommitIndex::build(&self.ctx, &self.options.index_options())?;

        let outcome: ReplayOutcome = {
            let mut replayer =
                GraftReplayer::new(&self.ctx, &self.options.branch_prefix, self.options.dry_run)?;
            replayer.run(&self.index, &mut self.unmatched)?
        };

        let report = Report::build(&self.index, &outcome, &self.unmatched);
        info!(
            grafted = report.graft_count(),
            unmatched = report.unmatched_paths.len(),
            "run complete"
        );
        Ok(report)
    }

    /// The correlation table built by [`execute`](Self::execute).
    #[must_use]
    pub const fn index(&self) -> &CandidateCommitIndex {
        &self.index
    }

    /// Source paths that failed to map.
    #[must_use]
    pub const fn unmatched(&self) -> &UnmatchedPathSet {
        &self.unmatched
    }

    /// The validated repository pair.
    #[must_use]
    pub const fn context(&self) -> &RepoPairContext<G> {
        &self.ctx
    }
}
