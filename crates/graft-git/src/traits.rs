//! Trait abstractions for git operations.
//!
//! This module defines the `GitOps` trait which abstracts the capability
//! surface the graft engine consumes, enabling dependency injection and
//! testability.

use std::path::Path;

use git2::Oid;

use crate::{ChangedFile, CommitInfo, Person, Repository, Result};

/// Trait for git repository operations.
///
/// Note: git operations are synchronous since git2 is a synchronous library,
/// and the engine issues one call at a time against each working tree.
#[allow(clippy::missing_errors_doc)]
pub trait GitOps {
    // === Repository Info ===

    /// Get the working directory path.
    fn workdir(&self) -> Option<&Path>;

    /// Check whether the repository has no commits.
    fn is_empty(&self) -> Result<bool>;

    /// Check if HEAD is detached.
    fn head_detached(&self) -> Result<bool>;

    // === Branch Operations ===

    /// Check if a local branch exists.
    fn branch_exists(&self, name: &str) -> bool;

    /// Check if a remote-tracking branch with this name exists.
    fn remote_branch_exists(&self, name: &str) -> bool;

    /// Check whether `name` is a valid branch name.
    fn is_valid_branch_name(&self, name: &str) -> bool;

    /// Create a new branch at the current HEAD.
    ///
    /// Returns the OID of the new branch's tip commit.
    fn create_branch(&self, name: &str) -> Result<Oid>;

    /// Checkout a branch.
    fn checkout(&self, branch: &str) -> Result<()>;

    /// List all local branches.
    fn list_branches(&self) -> Result<Vec<String>>;

    /// Get the commit ID for a branch.
    fn branch_commit(&self, branch: &str) -> Result<Oid>;

    // === History ===

    /// Walk history newest-first from `tips`, skipping commits before `since`.
    fn walk_history(&self, tips: &[Oid], since: Option<i64>) -> Result<Vec<CommitInfo>>;

    /// Paths a commit changed against its first parent, limited to `pathspecs`.
    fn touched_paths(&self, commit: Oid, pathspecs: &[String]) -> Result<Vec<String>>;

    /// Files a commit changed against its first parent.
    fn changed_files(&self, commit: Oid) -> Result<Vec<ChangedFile>>;

    /// Read a blob's content.
    fn blob_content(&self, blob: Oid) -> Result<Vec<u8>>;

    // === Working Directory ===

    /// Check if the working directory is clean.
    fn is_clean(&self) -> Result<bool>;

    /// Write (or with `None`, remove) a working-tree file.
    fn write_worktree_file(&self, path: &str, content: Option<&[u8]>) -> Result<()>;

    /// Stage the given paths.
    fn stage_paths(&self, paths: &[String]) -> Result<()>;

    /// Whether the staged tree differs from HEAD's tree.
    fn has_staged_changes(&self) -> Result<bool>;

    /// Commit the staged changes, preserving `author`.
    fn commit_staged(&self, message: &str, author: &Person) -> Result<Oid>;
}

impl GitOps for Repository {
    fn workdir(&self) -> Option<&Path> {
        Self::workdir(self)
    }

    fn is_empty(&self) -> Result<bool> {
        Self::is_empty(self)
    }

    fn head_detached(&self) -> Result<bool> {
        Self::head_detached(self)
    }

    fn branch_exists(&self, name: &str) -> bool {
        Self::branch_exists(self, name)
    }

    fn remote_branch_exists(&self, name: &str) -> bool {
        Self::remote_branch_exists(self, name)
    }

    fn is_valid_branch_name(&self, name: &str) -> bool {
        Self::is_valid_branch_name(name)
    }

    fn create_branch(&self, name: &str) -> Result<Oid> {
        Self::create_branch(self, name)
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        Self::checkout(self, branch)
    }

    fn list_branches(&self) -> Result<Vec<String>> {
        Self::list_branches(self)
    }

    fn branch_commit(&self, branch: &str) -> Result<Oid> {
        Self::branch_commit(self, branch)
    }

    fn walk_history(&self, tips: &[Oid], since: Option<i64>) -> Result<Vec<CommitInfo>> {
        Self::walk_history(self, tips, since)
    }

    fn touched_paths(&self, commit: Oid, pathspecs: &[String]) -> Result<Vec<String>> {
        Self::touched_paths(self, commit, pathspecs)
    }

    fn changed_files(&self, commit: Oid) -> Result<Vec<ChangedFile>> {
        Self::changed_files(self, commit)
    }

    fn blob_content(&self, blob: Oid) -> Result<Vec<u8>> {
        Self::blob_content(self, blob)
    }

    fn is_clean(&self) -> Result<bool> {
        Self::is_clean(self)
    }

    fn write_worktree_file(&self, path: &str, content: Option<&[u8]>) -> Result<()> {
        Self::write_worktree_file(self, path, content)
    }

    fn stage_paths(&self, paths: &[String]) -> Result<()> {
        Self::stage_paths(self, paths)
    }

    fn has_staged_changes(&self) -> Result<bool> {
        Self::has_staged_changes(self)
    }

    fn commit_staged(&self, message: &str, author: &Person) -> Result<Oid> {
        Self::commit_staged(self, message, author)
    }
}
