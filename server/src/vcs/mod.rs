//! VCS facade (spec §6). Injectable so the history-walking engines can be
//! exercised deterministically in tests without a real `.git` directory.

mod git2_backend;
mod mock;

pub use git2_backend::Git2Repo;
pub use mock::MockRepo;

use crate::error::Result;
use crate::model::{FileChange, RawCommit};
use chrono::{DateTime, Utc};
use std::path::Path;

/// A single commit as yielded by `log`, before per-file stats are pulled.
pub struct CommitHandle {
    pub hash: String,
    pub author: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Behavioral contract for repository access. The core engines depend on
/// this, never on a concrete backend — see `Git2Repo` for the real
/// implementation and `MockRepo` for deterministic tests.
pub trait VcsRepo {
    /// Commits newest-first, bounded by `since` (inclusive).
    fn log(&self, since: DateTime<Utc>) -> Result<Vec<CommitHandle>>;

    /// Per-file add/delete stats for a given commit hash. Returns `Err` only
    /// for I/O-level failures; a commit with no file changes (e.g. an empty
    /// merge) returns an empty vec.
    fn stats(&self, hash: &str) -> Result<Vec<FileChange>>;
}

/// Convenience: pull full `RawCommit`s (handle + stats) for the window,
/// skipping commits whose stats fail to load (§7 `PerItemSkip`).
pub fn raw_commits(repo: &dyn VcsRepo, since: DateTime<Utc>) -> Result<Vec<RawCommit>> {
    let handles = repo.log(since)?;
    let mut commits = Vec::with_capacity(handles.len());
    for h in handles {
        match repo.stats(&h.hash) {
            Ok(files) => commits.push(RawCommit {
                hash: h.hash,
                author: h.author,
                message: h.message,
                timestamp: h.timestamp,
                files,
            }),
            Err(e) => {
                tracing::warn!(hash = %h.hash, error = %e, "skipping commit with unreadable stats");
            }
        }
    }
    Ok(commits)
}

pub fn open(path: &Path) -> Result<Git2Repo> {
    Git2Repo::open(path)
}
