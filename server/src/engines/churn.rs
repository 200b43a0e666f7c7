//! Churn engine (spec §2.4): aggregates per-file add/delete counts and
//! commit counts over history. Grounded in the teacher's
//! `GitAnalysisService::get_file_metrics` accumulation pattern, replayed
//! against the injected `VcsRepo` instead of shelling out to `git log`.

use crate::cancel::CancellationToken;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::model::FileChurn;
use crate::vcs::{raw_commits, VcsRepo};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnReport {
    pub files: Vec<FileChurn>,
}

struct Accumulator {
    additions: u64,
    deletions: u64,
    commits: u64,
    authors: HashSet<String>,
    last_changed: DateTime<Utc>,
}

pub fn analyze(
    repo: &dyn VcsRepo,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
    reference_time: Option<DateTime<Utc>>,
) -> Result<ChurnReport> {
    let now = reference_time.unwrap_or_else(Utc::now);
    let since = now - Duration::days(config.churn_days as i64);
    let commits = raw_commits(repo, since)?;

    let mut acc: HashMap<String, Accumulator> = HashMap::new();

    for commit in &commits {
        cancel.check()?;
        for f in &commit.files {
            let entry = acc.entry(f.path.clone()).or_insert_with(|| Accumulator {
                additions: 0,
                deletions: 0,
                commits: 0,
                authors: HashSet::new(),
                last_changed: commit.timestamp,
            });
            entry.additions += f.added;
            entry.deletions += f.deleted;
            entry.commits += 1;
            entry.authors.insert(commit.author.clone());
            if commit.timestamp > entry.last_changed {
                entry.last_changed = commit.timestamp;
            }
        }
    }

    let max_commits = acc.values().map(|a| a.commits).max().unwrap_or(1).max(1) as f64;
    let max_changes = acc
        .values()
        .map(|a| a.additions + a.deletions)
        .max()
        .unwrap_or(1)
        .max(1) as f64;

    let mut files: Vec<FileChurn> = acc
        .into_iter()
        .map(|(path, a)| {
            let commit_factor = a.commits as f64 / max_commits;
            let change_factor = (a.additions + a.deletions) as f64 / max_changes;
            let churn_score = commit_factor * 0.6 + change_factor * 0.4;
            FileChurn {
                path,
                additions: a.additions,
                deletions: a.deletions,
                commits: a.commits,
                unique_authors: a.authors.len() as u64,
                last_changed: a.last_changed,
                churn_score,
            }
        })
        .collect();

    files.sort_by(|a, b| b.churn_score.partial_cmp(&a.churn_score).unwrap_or(std::cmp::Ordering::Equal));

    Ok(ChurnReport { files })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileChange;
    use crate::vcs::MockRepo;

    #[test]
    fn aggregates_across_commits() {
        let mut repo = MockRepo::new();
        let now = Utc::now();
        repo.push_commit(
            "c1",
            "alice",
            "edit",
            now,
            vec![FileChange {
                path: "a.rs".into(),
                added: 10,
                deleted: 2,
            }],
        );
        repo.push_commit(
            "c2",
            "bob",
            "edit",
            now - Duration::days(1),
            vec![FileChange {
                path: "a.rs".into(),
                added: 5,
                deleted: 1,
            }],
        );
        let config = AnalysisConfig::default();
        let report = analyze(&repo, &config, &CancellationToken::new(), Some(now)).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].commits, 2);
        assert_eq!(report.files[0].unique_authors, 2);
        assert_eq!(report.files[0].additions, 15);
    }

    #[test]
    fn empty_history_yields_empty_report() {
        let repo = MockRepo::new();
        let config = AnalysisConfig::default();
        let report = analyze(&repo, &config, &CancellationToken::new(), None).unwrap();
        assert!(report.files.is_empty());
    }
}
