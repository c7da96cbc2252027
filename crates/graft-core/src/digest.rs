//! Repository-independent commit identity.
//!
//! Commits replayed across unrelated histories get new native ids, so
//! correlation uses a digest of the metadata both copies share.

use std::fmt;

use graft_git::CommitInfo;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Content-derived identity of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CommitDigest(String);

impl CommitDigest {
    /// Compute a digest from the five identity fields.
    #[must_use]
    pub fn compute(
        committed_time: i64,
        authored_time: i64,
        message: &str,
        author_email: &str,
        committer_email: &str,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(committed_time.to_string());
        hasher.update([0_u8]);
        hasher.update(authored_time.to_string());
        hasher.update([0_u8]);
        hasher.update(message);
        hasher.update([0_u8]);
        hasher.update(author_email);
        hasher.update([0_u8]);
        hasher.update(committer_email);

        let hex = hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        Self(hex)
    }

    /// Digest of a commit's metadata.
    #[must_use]
    pub fn of(commit: &CommitInfo) -> Self {
        Self::compute(
            commit.committer.time,
            commit.author.time,
            &commit.message,
            &commit.author.email,
            &commit.committer.email,
        )
    }

    /// Hex representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
