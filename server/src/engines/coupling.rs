//! Temporal coupling engine (spec §4.2): mines co-changed file pairs across
//! history. Grounded in `other_examples`' git-mining `FileCoupling` shape and
//! the confidence-style strength formula the coupling-analyzer teacher file
//! uses for static instability.

use crate::cancel::CancellationToken;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::model::{CoupledPair, FilePair};
use crate::vcs::{raw_commits, VcsRepo};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouplingReport {
    pub pairs: Vec<CoupledPair>,
}

pub fn analyze(
    repo: &dyn VcsRepo,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
    reference_time: Option<DateTime<Utc>>,
) -> Result<CouplingReport> {
    let now = reference_time.unwrap_or_else(Utc::now);
    let since = now - Duration::days(config.lookback_days);
    let commits = raw_commits(repo, since)?;

    let mut commit_totals: HashMap<String, u64> = HashMap::new();
    let mut pair_counts: HashMap<FilePair, u64> = HashMap::new();

    for commit in &commits {
        cancel.check()?;
        for f in &commit.files {
            *commit_totals.entry(f.path.clone()).or_insert(0) += 1;
        }
        // Commits touching a single file contribute to commit totals but no
        // pair (spec §4.2 edge case).
        for i in 0..commit.files.len() {
            for j in (i + 1)..commit.files.len() {
                let pair = FilePair::new(&commit.files[i].path, &commit.files[j].path);
                *pair_counts.entry(pair).or_insert(0) += 1;
            }
        }
    }

    let mut pairs: Vec<CoupledPair> = pair_counts
        .into_iter()
        .filter(|(_, cochanges)| *cochanges as usize >= config.min_cochanges)
        .map(|(pair, cochanges)| {
            let commits_a = *commit_totals.get(&pair.file_a).unwrap_or(&0);
            let commits_b = *commit_totals.get(&pair.file_b).unwrap_or(&0);
            let denom = commits_a.min(commits_b).max(1);
            CoupledPair {
                pair,
                cochanges,
                commits_a,
                commits_b,
                strength: cochanges as f64 / denom as f64,
            }
        })
        .collect();

    pairs.sort_by(|a, b| b.strength.partial_cmp(&a.strength).unwrap_or(std::cmp::Ordering::Equal));

    Ok(CouplingReport { pairs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileChange;
    use crate::vcs::MockRepo;

    #[test]
    fn three_commit_cycle_yields_full_strength_pair() {
        let mut repo = MockRepo::new();
        let now = Utc::now();
        for i in 0..3 {
            repo.push_commit(
                format!("c{i}"),
                "alice",
                "touch both",
                now - Duration::days(i),
                vec![
                    FileChange { path: "a.go".into(), added: 1, deleted: 0 },
                    FileChange { path: "b.go".into(), added: 1, deleted: 0 },
                ],
            );
        }
        repo.push_commit(
            "c3",
            "alice",
            "touch c only",
            now - Duration::days(3),
            vec![FileChange { path: "c.go".into(), added: 1, deleted: 0 }],
        );

        let mut config = AnalysisConfig::default();
        config.min_cochanges = 1;
        let report = analyze(&repo, &config, &CancellationToken::new(), Some(now)).unwrap();

        assert_eq!(report.pairs.len(), 1);
        let pair = &report.pairs[0];
        assert_eq!(pair.pair.file_a, "a.go");
        assert_eq!(pair.pair.file_b, "b.go");
        assert!(pair.cochanges >= 3);
        assert!((pair.strength - 1.0).abs() < 1e-9);
    }

    #[test]
    fn below_threshold_pairs_are_dropped() {
        let mut repo = MockRepo::new();
        let now = Utc::now();
        repo.push_commit(
            "c1",
            "alice",
            "touch both once",
            now,
            vec![
                FileChange { path: "a.go".into(), added: 1, deleted: 0 },
                FileChange { path: "b.go".into(), added: 1, deleted: 0 },
            ],
        );
        let mut config = AnalysisConfig::default();
        config.min_cochanges = 2;
        let report = analyze(&repo, &config, &CancellationToken::new(), Some(now)).unwrap();
        assert!(report.pairs.is_empty());
    }
}
