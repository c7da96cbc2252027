//! # graft-core
//!
//! Cross-repository commit-graft engine. Correlates commits between two
//! repositories that share no history, then replays the source-only ones
//! onto a new destination branch.
//!
//! ```text
//! RepoPairContext ──► CandidateCommitIndex ──► GraftReplayer ──► Report
//!   (validate)          (digest table)          (+ PathMapper)
//! ```

pub mod config;
pub mod context;
pub mod digest;
pub mod error;
pub mod index;
pub mod paths;
pub mod replay;
pub mod report;
pub mod run;
pub mod token;

pub use config::Config;
pub use context::{RepoPairContext, Side};
pub use digest::CommitDigest;
pub use error::{Error, Result};
pub use index::{CandidateCommitEntry, CandidateCommitIndex, IndexOptions};
pub use paths::{PathMapper, PathRule, TrackedPathMap};
pub use replay::{GraftRecord, GraftReplayer, ReplayOutcome, ReplayPhase, UnmatchedPathSet};
pub use report::{CommitSummary, Presence, Report};
pub use run::{GraftRun, RunOptions};
