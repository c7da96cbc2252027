//! Read-only run summary.

use graft_git::CommitInfo;
use serde::Serialize;

use crate::index::{CandidateCommitEntry, CandidateCommitIndex};
use crate::replay::{ReplayOutcome, UnmatchedPathSet};

/// Where a correlated change is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// Already in both repositories.
    InBoth,
    /// Only in the destination.
    DestinationOnly,
    /// Only in the source: grafted this run or eligible but skipped.
    SourceOnly,
}

impl Presence {
    /// Classify a table entry.
    #[must_use]
    pub const fn of(entry: &CandidateCommitEntry) -> Self {
        match (&entry.source_commit, &entry.destination_commit) {
            (Some(_), Some(_)) => Self::InBoth,
            (Some(_), None) => Self::SourceOnly,
            (None, _) => Self::DestinationOnly,
        }
    }
}

/// Short description of a commit for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub id: String,
    pub summary: String,
    pub time: i64,
}

impl From<&CommitInfo> for CommitSummary {
    fn from(commit: &CommitInfo) -> Self {
        Self {
            id: commit.short_id(),
            summary: commit.summary().to_string(),
            time: commit.committer.time,
        }
    }
}

/// A classified correlation table entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntryReport {
    pub digest: String,
    pub presence: Presence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<CommitSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<CommitSummary>,
}

/// A replayed (or planned) commit.
#[derive(Debug, Clone, Serialize)]
pub struct GraftReport {
    pub source: CommitSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    pub files: Vec<String>,
}

/// Summary of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub in_both: usize,
    pub destination_only: usize,
    pub source_only: usize,
    pub entries: Vec<EntryReport>,
    pub grafted: Vec<GraftReport>,
    pub skipped: Vec<CommitSummary>,
    pub unmatched_paths: UnmatchedPathSet,
}

impl Report {
    /// Summarize the final table, replay outcome and unmatched paths.
    #[must_use]
    pub fn build(
        index: &CandidateCommitIndex,
        outcome: &ReplayOutcome,
        unmatched: &UnmatchedPathSet,
    ) -> Self {
        let entries: Vec<EntryReport> = index
            .entries()
            .iter()
            .map(|entry| EntryReport {
                digest: entry.digest.to_string(),
                presence: Presence::of(entry),
                source: entry.source_commit.as_ref().map(CommitSummary::from),
                destination: entry.destination_commit.as_ref().map(CommitSummary::from),
            })
            .collect();

        let count = |presence: Presence| entries.iter().filter(|e| e.presence == presence).count();

        Self {
            dry_run: outcome.dry_run,
            branch: outcome.branch.clone(),
            in_both: count(Presence::InBoth),
            destination_only: count(Presence::DestinationOnly),
            source_only: count(Presence::SourceOnly),
            grafted: outcome
                .grafted
                .iter()
                .map(|g| GraftReport {
                    source: CommitSummary::from(&g.source),
                    created: g.created.map(|oid| oid.to_string()),
                    files: g.files.clone(),
                })
                .collect(),
            skipped: outcome.skipped.iter().map(CommitSummary::from).collect(),
            unmatched_paths: unmatched.clone(),
            entries,
        }
    }

    /// Number of commits created (or planned, for a dry run).
    #[must_use]
    pub fn graft_count(&self) -> usize {
        self.grafted.len()
    }
}
