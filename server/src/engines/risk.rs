//! JIT change-risk engine (spec §4.1): replays commit history chronologically
//! and scores each commit against population-normalized weights.

use crate::cancel::CancellationToken;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::model::{CommitFeatures, CommitRisk, NormalizationStats, RiskLevel};
use crate::stats::{self, clamp01, shannon_entropy};
use crate::vcs::{raw_commits, VcsRepo};
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

static FIX_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\bfix(es|ed)?\b",
        r"(?i)\bbug\b",
        r"(?i)\bpatch\b",
        r"(?i)\bresolve[sd]?\b",
        r"(?i)\bclose[sd]?\s+#\d+",
        r"(?i)\bdefect\b",
        r"(?i)\bissue\b",
        r"(?i)\berror\b",
        r"(?i)\bcrash\b",
    ])
    .expect("fix pattern set is valid")
});

static AUTOMATED_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)^chore\(?deps?\)?:",
        r"(?i)^chore:\s*(bump|update)\w*\s+.*(version|tag|image)",
        r"(?i)^(docs|style|ci|build)(\(.*\))?:",
        r"(?i)^merge\b",
        r"\[skip ci\]",
        r"(?i)^release:?\s*v?\d+\.\d+",
    ])
    .expect("automated pattern set is valid")
});

pub fn is_fix_commit(message: &str) -> bool {
    FIX_PATTERNS.is_match(message)
}

pub fn is_automated_commit(message: &str) -> bool {
    AUTOMATED_PATTERNS.is_match(message)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub commits: Vec<CommitRisk>,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
    pub fix_count: usize,
    pub p50: f64,
    pub p95: f64,
}

pub fn analyze(
    repo: &dyn VcsRepo,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
    reference_time: Option<DateTime<Utc>>,
) -> Result<RiskReport> {
    let now = reference_time.unwrap_or_else(Utc::now);
    let since = now - Duration::days(config.lookback_days);

    let mut commits = raw_commits(repo, since)?;
    // VCS facade yields newest-first; replay chronologically so experience
    // and prior-author accumulators only ever see the past.
    commits.reverse();

    let mut author_commit_counts: HashMap<String, u64> = HashMap::new();
    let mut file_change_counts: HashMap<String, u64> = HashMap::new();
    let mut file_authors: HashMap<String, HashSet<String>> = HashMap::new();

    let mut features = Vec::with_capacity(commits.len());

    for commit in &commits {
        cancel.check()?;

        let author_experience = *author_commit_counts.get(&commit.author).unwrap_or(&0);

        let unique_changes: u64 = commit
            .files
            .iter()
            .map(|f| *file_change_counts.get(&f.path).unwrap_or(&0))
            .sum();

        let mut developers: HashSet<String> = HashSet::new();
        developers.insert(commit.author.clone());
        for f in &commit.files {
            if let Some(authors) = file_authors.get(&f.path) {
                developers.extend(authors.iter().cloned());
            }
        }
        let num_developers = developers.len() as u64;

        let lines_added: u64 = commit.files.iter().map(|f| f.added).sum();
        let lines_deleted: u64 = commit.files.iter().map(|f| f.deleted).sum();
        let num_files = commit.files.len() as u64;

        let total_touched: u64 = commit.files.iter().map(|f| f.added + f.deleted).sum();
        let entropy = if total_touched == 0 || commit.files.len() <= 1 {
            0.0
        } else {
            let proportions: Vec<f64> = commit
                .files
                .iter()
                .map(|f| (f.added + f.deleted) as f64 / total_touched as f64)
                .collect();
            shannon_entropy(&proportions)
        };

        features.push(CommitFeatures {
            hash: commit.hash.clone(),
            author: commit.author.clone(),
            message: commit.message.clone(),
            timestamp: commit.timestamp,
            lines_added,
            lines_deleted,
            num_files,
            num_developers,
            unique_changes,
            author_experience,
            entropy,
            is_fix: is_fix_commit(&commit.message),
            is_automated: is_automated_commit(&commit.message),
            files_modified: commit.files.iter().map(|f| f.path.clone()).collect(),
        });

        // Update accumulators *after* deriving this commit's features so the
        // state seen above reflects strictly prior history.
        *author_commit_counts.entry(commit.author.clone()).or_insert(0) += 1;
        for f in &commit.files {
            *file_change_counts.entry(f.path.clone()).or_insert(0) += 1;
            file_authors
                .entry(f.path.clone())
                .or_default()
                .insert(commit.author.clone());
        }
    }

    let norm = NormalizationStats::from_commits(&features);
    let weights = &config.risk_weights;

    let mut scored: Vec<CommitRisk> = features
        .iter()
        .map(|f| {
            let score = if f.is_automated {
                0.0
            } else {
                score_commit(f, &norm, weights)
            };
            CommitRisk {
                hash: f.hash.clone(),
                author: f.author.clone(),
                message: f.message.clone(),
                timestamp: f.timestamp,
                score,
                risk_level: RiskLevel::from_score(score),
                is_fix: f.is_fix,
                is_automated: f.is_automated,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let high_count = scored.iter().filter(|c| c.risk_level == RiskLevel::High).count();
    let medium_count = scored.iter().filter(|c| c.risk_level == RiskLevel::Medium).count();
    let low_count = scored.iter().filter(|c| c.risk_level == RiskLevel::Low).count();
    let fix_count = scored.iter().filter(|c| c.is_fix).count();

    let mut ascending: Vec<f64> = scored.iter().map(|c| c.score).collect();
    ascending.sort_by(|a, b| a.partial_cmp(b).unwrap());

    Ok(RiskReport {
        p50: stats::p50(&ascending),
        p95: stats::p95(&ascending),
        commits: scored,
        high_count,
        medium_count,
        low_count,
        fix_count,
    })
}

fn score_commit(
    f: &CommitFeatures,
    norm: &NormalizationStats,
    w: &crate::config::ChangeRiskWeights,
) -> f64 {
    let fix_term = if f.is_fix { 1.0 } else { 0.0 };
    let entropy_term = clamp01(f.entropy / norm.max_entropy);
    let la_term = clamp01(f.lines_added as f64 / norm.max_lines_added);
    let ld_term = clamp01(f.lines_deleted as f64 / norm.max_lines_deleted);
    let nf_term = clamp01(f.num_files as f64 / norm.max_num_files);
    let nuc_term = clamp01(f.unique_changes as f64 / norm.max_unique_changes);
    let ndev_term = clamp01(f.num_developers as f64 / norm.max_num_developers);
    let exp_term = clamp01(1.0 - (f.author_experience as f64 / norm.max_author_experience));

    let score = w.fix * fix_term
        + w.entropy * entropy_term
        + w.la * la_term
        + w.ld * ld_term
        + w.nf * nf_term
        + w.nuc * nuc_term
        + w.ndev * ndev_term
        + w.exp * exp_term;

    clamp01(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileChange;
    use crate::vcs::MockRepo;

    #[test]
    fn detects_fix_and_automated_messages() {
        assert!(is_fix_commit("fix: null pointer in parser"));
        assert!(is_fix_commit("Closes #42"));
        assert!(!is_fix_commit("add new feature"));
        assert!(is_automated_commit("chore: updated image tag"));
        assert!(is_automated_commit("docs: update readme"));
        assert!(!is_automated_commit("add risk scoring"));
    }

    #[test]
    fn automated_commits_are_forced_low() {
        let mut repo = MockRepo::new();
        let now = Utc::now();
        repo.push_commit(
            "c1",
            "alice",
            "chore: updated image tag",
            now,
            vec![FileChange {
                path: "deploy.yaml".into(),
                added: 500,
                deleted: 500,
            }],
        );
        let config = AnalysisConfig::default();
        let report = analyze(&repo, &config, &CancellationToken::new(), Some(now)).unwrap();
        assert_eq!(report.commits[0].risk_level, RiskLevel::Low);
    }

    #[test]
    fn second_commit_experience_increments() {
        let mut repo = MockRepo::new();
        let t0 = Utc::now() - Duration::days(10);
        let t1 = Utc::now() - Duration::days(5);
        // VCS facade order is newest-first.
        repo.push_commit(
            "c2",
            "alice",
            "add feature",
            t1,
            vec![FileChange {
                path: "a.rs".into(),
                added: 10,
                deleted: 0,
            }],
        );
        repo.push_commit(
            "c1",
            "alice",
            "add feature",
            t0,
            vec![FileChange {
                path: "a.rs".into(),
                added: 10,
                deleted: 0,
            }],
        );
        let config = AnalysisConfig::default();
        let report = analyze(&repo, &config, &CancellationToken::new(), None).unwrap();
        assert_eq!(report.commits.len(), 2);
    }

    #[test]
    fn empty_history_yields_zeroed_summary() {
        let repo = MockRepo::new();
        let config = AnalysisConfig::default();
        let report = analyze(&repo, &config, &CancellationToken::new(), None).unwrap();
        assert!(report.commits.is_empty());
        assert_eq!(report.p50, 0.0);
        assert_eq!(report.p95, 0.0);
    }
}
