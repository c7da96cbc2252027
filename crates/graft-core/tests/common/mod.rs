//! Shared fixtures: real git repositories in temporary directories.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;

use git2::{BranchType, Oid, RepositoryInitOptions, Signature, Time};
use graft_core::{RepoPairContext, RunOptions, TrackedPathMap};
use tempfile::TempDir;

pub const AUTHOR_EMAIL: &str = "dev@example.com";

/// Seconds since epoch, `minutes_ago` minutes before now.
pub fn minutes_ago(minutes: i64) -> i64 {
    chrono::Utc::now().timestamp() - minutes * 60
}

/// A repository on `main` inside a temp directory.
pub struct Fixture {
    pub dir: TempDir,
    pub repo: git2::Repository,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = git2::Repository::init_opts(dir.path(), &opts).expect("Failed to init repo");
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Graft Bot").unwrap();
            config.set_str("user.email", "graft@example.com").unwrap();
        }
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Open a fresh `graft_git` handle on this repository.
    pub fn open(&self) -> graft_git::Repository {
        graft_git::Repository::open(self.path()).unwrap()
    }

    /// Commit file changes (`None` deletes) with author and committer at `time`.
    pub fn commit(&self, files: &[(&str, Option<&str>)], message: &str, time: i64) -> Oid {
        self.commit_as(files, message, time, AUTHOR_EMAIL)
    }

    /// Like [`commit`](Self::commit) with an explicit committer email.
    pub fn commit_as(
        &self,
        files: &[(&str, Option<&str>)],
        message: &str,
        time: i64,
        committer_email: &str,
    ) -> Oid {
        let mut index = self.repo.index().unwrap();
        for (path, content) in files {
            let full = self.path().join(path);
            match content {
                Some(text) => {
                    fs::create_dir_all(full.parent().unwrap()).unwrap();
                    fs::write(&full, text).unwrap();
                    index.add_path(Path::new(path)).unwrap();
                }
                None => {
                    fs::remove_file(&full).unwrap();
                    index.remove_path(Path::new(path)).unwrap();
                }
            }
        }
        index.write().unwrap();

        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let when = Time::new(time, 0);
        let author = Signature::new("Dev", AUTHOR_EMAIL, &when).unwrap();
        let committer = Signature::new("Dev", committer_email, &when).unwrap();

        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &author, &committer, message, &tree, &parents)
            .unwrap()
    }

    /// Summaries of a branch's history, newest first, stopping at `stop`.
    pub fn summaries_until(&self, branch: &str, stop: Oid) -> Vec<String> {
        let mut commit = self.branch_tip(branch);
        let mut out = Vec::new();
        while commit.id() != stop {
            out.push(commit.summary().unwrap_or("").to_string());
            commit = commit.parent(0).unwrap();
        }
        out
    }

    pub fn branch_tip(&self, branch: &str) -> git2::Commit<'_> {
        self.repo
            .find_branch(branch, BranchType::Local)
            .unwrap()
            .get()
            .peel_to_commit()
            .unwrap()
    }

    pub fn branch_names(&self) -> Vec<String> {
        self.repo
            .branches(Some(BranchType::Local))
            .unwrap()
            .filter_map(Result::ok)
            .filter_map(|(b, _)| b.name().ok().flatten().map(String::from))
            .collect()
    }

    /// Whether `path` exists in the tree of `commit`.
    pub fn tree_has(&self, commit: &git2::Commit<'_>, path: &str) -> bool {
        commit.tree().unwrap().get_path(Path::new(path)).is_ok()
    }

    /// Content of `path` in the tree of `commit`.
    pub fn tree_content(&self, commit: &git2::Commit<'_>, path: &str) -> String {
        let entry = commit.tree().unwrap().get_path(Path::new(path)).unwrap();
        let blob = self.repo.find_blob(entry.id()).unwrap();
        String::from_utf8(blob.content().to_vec()).unwrap()
    }
}

/// Files the destination split starts with. Mapping only writes to paths
/// that already exist, so every `pkg/` file a test grafts into is here.
pub const DESTINATION_FILES: &[(&str, &str)] = &[
    ("pkg/a.txt", "a v0
"),
    ("pkg/b.txt", "b v0
"),
    ("pkg/c.txt", "c v0
"),
    ("pkg/ok.txt", "ok v0
"),
    ("pkg/one.txt", "1 v0
"),
    ("pkg/two.txt", "2 v0
"),
    ("pkg/three.txt", "3 v0
"),
    ("README.md", "split
"),
];

/// A source repo tracking `lib/` and a destination tracking `pkg/`.
pub struct Pair {
    pub source: Fixture,
    pub destination: Fixture,
    pub source_root: Oid,
    pub destination_root: Oid,
}

impl Pair {
    pub fn new() -> Self {
        let source = Fixture::new();
        let source_root = source.commit(
            &[("lib/a.txt", Some("a v0\n")), ("README.md", Some("source\n"))],
            "Initial source layout",
            minutes_ago(600),
        );

        let destination = Fixture::new();
        let files: Vec<(&str, Option<&str>)> = DESTINATION_FILES
            .iter()
            .map(|&(path, content)| (path, Some(content)))
            .collect();
        let destination_root = destination.commit(
            &files,
            "Initial split",
            minutes_ago(590),
        );

        Self {
            source,
            destination,
            source_root,
            destination_root,
        }
    }

    pub fn paths(&self) -> TrackedPathMap {
        TrackedPathMap::parse(&["lib > pkg"], &[], &[]).unwrap()
    }

    pub fn context(&self) -> RepoPairContext<graft_git::Repository> {
        self.context_with(self.paths())
    }

    pub fn context_with(&self, paths: TrackedPathMap) -> RepoPairContext<graft_git::Repository> {
        RepoPairContext::new(
            self.source.open(),
            "main",
            self.destination.open(),
            "main",
            paths,
        )
        .expect("pair should validate")
    }
}

pub fn options(dry_run: bool) -> RunOptions {
    RunOptions {
        lookback_days: Some(30),
        dry_run,
        branch_prefix: "graft".into(),
        merge_bot_emails: vec!["noreply@github.com".into()],
    }
}
