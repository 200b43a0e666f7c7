use super::{CommitHandle, VcsRepo};
use crate::error::Result;
use crate::model::FileChange;
use chrono::{DateTime, Utc};

/// A fixed, in-memory repository used for deterministic tests of the
/// history-walking engines, per the injectable-facade design note.
#[derive(Default)]
pub struct MockRepo {
    commits: Vec<(CommitHandleOwned, Vec<FileChange>)>,
}

#[derive(Clone)]
struct CommitHandleOwned {
    hash: String,
    author: String,
    message: String,
    timestamp: DateTime<Utc>,
}

impl MockRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits must be pushed newest-first to match real VCS log order.
    pub fn push_commit(
        &mut self,
        hash: impl Into<String>,
        author: impl Into<String>,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
        files: Vec<FileChange>,
    ) -> &mut Self {
        self.commits.push((
            CommitHandleOwned {
                hash: hash.into(),
                author: author.into(),
                message: message.into(),
                timestamp,
            },
            files,
        ));
        self
    }
}

impl VcsRepo for MockRepo {
    fn log(&self, since: DateTime<Utc>) -> Result<Vec<CommitHandle>> {
        Ok(self
            .commits
            .iter()
            .filter(|(c, _)| c.timestamp >= since)
            .map(|(c, _)| CommitHandle {
                hash: c.hash.clone(),
                author: c.author.clone(),
                message: c.message.clone(),
                timestamp: c.timestamp,
            })
            .collect())
    }

    fn stats(&self, hash: &str) -> Result<Vec<FileChange>> {
        Ok(self
            .commits
            .iter()
            .find(|(c, _)| c.hash == hash)
            .map(|(_, files)| files.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::raw_commits;

    #[test]
    fn mock_repo_roundtrips_commits() {
        let mut repo = MockRepo::new();
        let now = Utc::now();
        repo.push_commit(
            "c1",
            "alice",
            "fix: bug",
            now,
            vec![FileChange {
                path: "a.rs".into(),
                added: 3,
                deleted: 1,
            }],
        );
        let commits = raw_commits(&repo, now - chrono::Duration::days(1)).unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].files[0].path, "a.rs");
    }
}
