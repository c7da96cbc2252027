//! # graft-git
//!
//! Git operations abstraction layer for graft, built on git2-rs.
//! Provides the narrow capability surface the graft engine consumes:
//! working-tree and branch state, bounded history walks, first-parent
//! diffs with blob access, branch creation and author-preserving commits.

mod error;
mod history;
mod repository;
mod traits;

pub use error::{Error, Result};
pub use git2::Oid;
pub use history::{ChangedFile, CommitInfo, Person};
pub use repository::Repository;
pub use traits::GitOps;
