use super::{CommitHandle, VcsRepo};
use crate::error::{AnalysisError, Result};
use crate::model::FileChange;
use chrono::{DateTime, TimeZone, Utc};
use git2::{Diff, DiffOptions, Repository};
use std::path::Path;

pub struct Git2Repo {
    repo: Repository,
}

impl Git2Repo {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AnalysisError::RepositoryNotFound {
                path: path.to_path_buf(),
            });
        }
        let repo = Repository::open(path).map_err(|source| AnalysisError::RepositoryOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { repo })
    }
}

impl VcsRepo for Git2Repo {
    fn log(&self, since: DateTime<Utc>) -> Result<Vec<CommitHandle>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(git2::Sort::TIME)?;

        let mut handles = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            let when = commit.time();
            let timestamp = Utc
                .timestamp_opt(when.seconds(), 0)
                .single()
                .unwrap_or_else(Utc::now);
            if timestamp < since {
                break;
            }
            handles.push(CommitHandle {
                hash: commit.id().to_string(),
                author: commit.author().name().unwrap_or("unknown").to_string(),
                message: commit.message().unwrap_or("").to_string(),
                timestamp,
            });
        }
        Ok(handles)
    }

    fn stats(&self, hash: &str) -> Result<Vec<FileChange>> {
        let oid = git2::Oid::from_str(hash)?;
        let commit = self.repo.find_commit(oid)?;
        let tree = commit.tree()?;
        let parent_tree = commit.parents().next().and_then(|p| p.tree().ok());

        let mut opts = DiffOptions::new();
        let diff: Diff = self.repo.diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&tree),
            Some(&mut opts),
        )?;

        let stats = diff.stats()?;
        let _ = stats;

        let changes = std::cell::RefCell::new(Vec::new());
        diff.foreach(
            &mut |delta, _progress| {
                if let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) {
                    changes.borrow_mut().push(FileChange {
                        path: path.to_string_lossy().to_string(),
                        added: 0,
                        deleted: 0,
                    });
                }
                true
            },
            None,
            None,
            Some(&mut |delta, hunk, line| {
                if let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) {
                    let path = path.to_string_lossy().to_string();
                    if let Some(entry) = changes
                        .borrow_mut()
                        .iter_mut()
                        .find(|c: &&mut FileChange| c.path == path)
                    {
                        match line.origin() {
                            '+' => entry.added += 1,
                            '-' => entry.deleted += 1,
                            _ => {}
                        }
                    }
                }
                let _ = hunk;
                true
            }),
        )?;

        Ok(changes.into_inner())
    }
}
