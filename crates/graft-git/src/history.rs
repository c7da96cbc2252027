//! History traversal, diffing and commit creation.
//!
//! Everything the graft engine needs to read a commit out of one repository
//! and write its change into another, expressed over owned value types so
//! callers never hold git2 borrows across operations.

use std::fs;
use std::path::Path;

use git2::{Delta, DiffOptions, Oid, Signature, Sort, Time};

use crate::Repository;
use crate::error::Result;

/// An author or committer identity with its timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Seconds since the Unix epoch.
    pub time: i64,
    /// Timezone offset in minutes.
    pub offset_minutes: i32,
}

impl Person {
    fn from_signature(sig: &Signature<'_>) -> Self {
        Self {
            name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
            email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
            time: sig.when().seconds(),
            offset_minutes: sig.when().offset_minutes(),
        }
    }

    fn to_signature(&self) -> Result<Signature<'static>> {
        let when = Time::new(self.time, self.offset_minutes);
        Ok(Signature::new(&self.name, &self.email, &when)?)
    }
}

/// Owned snapshot of a commit's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Native commit id.
    pub id: Oid,
    /// Parent ids, first parent first.
    pub parent_ids: Vec<Oid>,
    /// Author identity.
    pub author: Person,
    /// Committer identity.
    pub committer: Person,
    /// Full commit message.
    pub message: String,
}

impl CommitInfo {
    fn from_commit(commit: &git2::Commit<'_>) -> Self {
        Self {
            id: commit.id(),
            parent_ids: commit.parent_ids().collect(),
            author: Person::from_signature(&commit.author()),
            committer: Person::from_signature(&commit.committer()),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        }
    }

    /// Whether the commit has no parents.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_ids.is_empty()
    }

    /// First line of the message.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }

    /// Abbreviated commit id.
    #[must_use]
    pub fn short_id(&self) -> String {
        let id = self.id.to_string();
        id.get(..8).unwrap_or(&id).to_owned()
    }
}

/// A file touched by a commit relative to its first parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    /// Repository-relative path with `/` separators.
    pub path: String,
    /// Blob holding the new content, `None` when the file was deleted.
    pub blob: Option<Oid>,
}

impl ChangedFile {
    /// Whether the change removes the file.
    #[must_use]
    pub const fn is_deletion(&self) -> bool {
        self.blob.is_none()
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

impl Repository {
    /// Walk history newest-first by committer time from the given tips.
    ///
    /// With a `since` cutoff (seconds since epoch) the walk stops at the first
    /// commit committed before it, so only the window is read. A commit newer
    /// than the cutoff that is reachable only through an older one, such as a
    /// merged branch with a skewed clock, is not visited.
    ///
    /// # Errors
    /// Returns error if the revwalk fails.
    pub fn walk_history(&self, tips: &[Oid], since: Option<i64>) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.inner.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        for tip in tips {
            revwalk.push(*tip)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.inner.find_commit(oid?)?;
            if since.is_some_and(|cutoff| commit.time().seconds() < cutoff) {
                break;
            }
            commits.push(CommitInfo::from_commit(&commit));
        }

        Ok(commits)
    }

    /// Paths changed by a commit against its first parent, limited to `pathspecs`.
    ///
    /// Root commits are diffed against the empty tree.
    ///
    /// # Errors
    /// Returns error if the commit or its trees cannot be read.
    pub fn touched_paths(&self, commit: Oid, pathspecs: &[String]) -> Result<Vec<String>> {
        let mut opts = DiffOptions::new();
        for spec in pathspecs {
            opts.pathspec(spec);
        }

        let diff = self.first_parent_diff(commit, &mut opts)?;
        let paths = diff
            .deltas()
            .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
            .map(path_string)
            .collect();

        Ok(paths)
    }

    /// Every file a commit changed against its first parent.
    ///
    /// Renames are reported as a deletion plus an addition.
    ///
    /// # Errors
    /// Returns error if the commit or its trees cannot be read.
    pub fn changed_files(&self, commit: Oid) -> Result<Vec<ChangedFile>> {
        let diff = self.first_parent_diff(commit, &mut DiffOptions::new())?;

        let files = diff
            .deltas()
            .filter_map(|delta| match delta.status() {
                Delta::Deleted => delta.old_file().path().map(|p| ChangedFile {
                    path: path_string(p),
                    blob: None,
                }),
                Delta::Unmodified | Delta::Ignored | Delta::Untracked => None,
                _ => delta.new_file().path().map(|p| ChangedFile {
                    path: path_string(p),
                    blob: Some(delta.new_file().id()),
                }),
            })
            .collect();

        Ok(files)
    }

    fn first_parent_diff(&self, commit: Oid, opts: &mut DiffOptions) -> Result<git2::Diff<'_>> {
        let commit = self.inner.find_commit(commit)?;
        let tree = commit.tree()?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        Ok(self
            .inner
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(opts))?)
    }

    /// Read a blob's raw content.
    ///
    /// # Errors
    /// Returns error if the blob does not exist.
    pub fn blob_content(&self, blob: Oid) -> Result<Vec<u8>> {
        Ok(self.inner.find_blob(blob)?.content().to_vec())
    }

    /// Write a file into the working tree, or remove it when `content` is `None`.
    ///
    /// # Errors
    /// Returns error on filesystem failure or for bare repositories.
    pub fn write_worktree_file(&self, path: &str, content: Option<&[u8]>) -> Result<()> {
        let target = self.require_workdir()?.join(path);
        match content {
            Some(bytes) => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, bytes)?;
            }
            None => {
                if target.exists() {
                    fs::remove_file(&target)?;
                }
            }
        }
        Ok(())
    }

    /// Stage the given repository-relative paths, recording removals for
    /// paths missing from the working tree.
    ///
    /// # Errors
    /// Returns error if the index cannot be updated.
    pub fn stage_paths(&self, paths: &[String]) -> Result<()> {
        let workdir = self.require_workdir()?;
        let mut index = self.inner.index()?;
        for path in paths {
            let relative = Path::new(path);
            if workdir.join(relative).exists() {
                index.add_path(relative)?;
            } else {
                index.remove_path(relative)?;
            }
        }
        index.write()?;
        Ok(())
    }

    /// Whether the index differs from the tree of HEAD.
    ///
    /// # Errors
    /// Returns error if the index tree cannot be written or HEAD is unborn.
    pub fn has_staged_changes(&self) -> Result<bool> {
        let staged = self.inner.index()?.write_tree()?;
        let head = self.inner.head()?.peel_to_tree()?;
        Ok(staged != head.id())
    }

    /// Commit the index on top of HEAD, preserving the given author.
    ///
    /// The committer is the repository's configured identity, falling back to
    /// the author's identity at the current time when none is configured.
    ///
    /// # Errors
    /// Returns error if the tree or commit cannot be written.
    pub fn commit_staged(&self, message: &str, author: &Person) -> Result<Oid> {
        let mut index = self.inner.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.inner.find_tree(tree_id)?;

        let author_sig = author.to_signature()?;
        let committer_sig = match self.inner.signature() {
            Ok(sig) => sig,
            Err(_) => Signature::now(&author.name, &author.email)?,
        };

        let parent = self.inner.head()?.peel_to_commit()?;
        let oid = self.inner.commit(
            Some("HEAD"),
            &author_sig,
            &committer_sig,
            message,
            &tree,
            &[&parent],
        )?;

        Ok(oid)
    }
}
