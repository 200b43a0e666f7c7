//! Defect-probability aggregator (spec §4.8): linearly combines per-file
//! metrics into a bounded probability with risk bands and recommendations.
//! Grounded in the teacher's `defect_probability.rs` threshold-predicate
//! style for recommendations, with two deliberate departures: no sigmoid
//! transform (spec wants the clamped linear sum directly), and CDF
//! normalization reused from `stats` rather than the teacher's own table.

use crate::config::DefectWeights;
use crate::model::{DefectScore, FileMetrics, RiskLevel};
use crate::stats::{clamp01, p50, p95};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectReport {
    pub scores: Vec<DefectScore>,
    pub total_files: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
    pub average_probability: f64,
    pub p50: f64,
    pub p95: f64,
}

const HIGH_CHURN: f64 = 0.7;
const HIGH_COMPLEXITY: f64 = 0.7;
const HIGH_DUPLICATION: f64 = 0.5;
const HIGH_CYCLOMATIC: f64 = 15.0;

pub fn analyze(files: &[FileMetrics], weights: &DefectWeights) -> DefectReport {
    let mut scores: Vec<DefectScore> = files
        .iter()
        .map(|f| {
            let churn = clamp01(f.churn_score);
            let complexity = clamp01(f.complexity);
            let duplication = clamp01(f.duplicate_ratio);
            let coupling = clamp01(f.coupling);

            let probability = clamp01(
                weights.churn * churn
                    + weights.complexity * complexity
                    + weights.duplication * duplication
                    + weights.coupling * coupling,
            );

            DefectScore {
                path: f.path.clone(),
                probability,
                risk_level: RiskLevel::from_score(probability),
                recommendations: recommendations(f, probability),
            }
        })
        .collect();

    scores.sort_by(|a, b| b.probability.partial_cmp(&a.probability).unwrap_or(std::cmp::Ordering::Equal));

    let high_count = scores.iter().filter(|s| s.risk_level == RiskLevel::High).count();
    let medium_count = scores.iter().filter(|s| s.risk_level == RiskLevel::Medium).count();
    let low_count = scores.iter().filter(|s| s.risk_level == RiskLevel::Low).count();

    let average_probability = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|s| s.probability).sum::<f64>() / scores.len() as f64
    };

    let mut ascending: Vec<f64> = scores.iter().map(|s| s.probability).collect();
    ascending.sort_by(|a, b| a.partial_cmp(b).unwrap());

    DefectReport {
        total_files: scores.len(),
        high_count,
        medium_count,
        low_count,
        average_probability,
        p50: p50(&ascending),
        p95: p95(&ascending),
        scores,
    }
}

fn recommendations(f: &FileMetrics, probability: f64) -> Vec<String> {
    let mut recs = Vec::new();

    if probability >= 0.7 {
        recs.push(format!("CRITICAL: {} is a high-risk refactoring target", f.path));
    } else if probability >= 0.3 {
        recs.push(format!("HIGH RISK: monitor {} for further degradation", f.path));
    }

    if f.churn_score >= HIGH_CHURN {
        recs.push(format!(
            "High churn ({:.2}) — stabilize with tests before further changes",
            f.churn_score
        ));
    }
    if f.complexity >= HIGH_COMPLEXITY || f.cyclomatic_complexity >= HIGH_CYCLOMATIC {
        recs.push("High complexity — consider extracting smaller functions".to_string());
    }
    if f.duplicate_ratio >= HIGH_DUPLICATION {
        recs.push("High duplication — extract shared logic into a common module".to_string());
    }

    if recs.is_empty() {
        recs.push("No action required".to_string());
    }
    recs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(churn: f64, complexity: f64, duplication: f64, coupling: f64) -> FileMetrics {
        FileMetrics {
            path: "f.rs".into(),
            churn_score: churn,
            complexity,
            duplicate_ratio: duplication,
            cyclomatic_complexity: complexity * 30.0,
            coupling,
        }
    }

    #[test]
    fn probability_is_bounded_and_monotone() {
        let weights = DefectWeights::default();
        let low = analyze(&[metrics(0.1, 0.1, 0.1, 0.1)], &weights);
        let high = analyze(&[metrics(0.9, 0.9, 0.9, 0.9)], &weights);
        assert!(low.scores[0].probability >= 0.0 && low.scores[0].probability <= 1.0);
        assert!(high.scores[0].probability > low.scores[0].probability);
    }

    #[test]
    fn always_has_at_least_one_recommendation() {
        let weights = DefectWeights::default();
        let report = analyze(&[metrics(0.0, 0.0, 0.0, 0.0)], &weights);
        assert!(!report.scores[0].recommendations.is_empty());
    }

    #[test]
    fn empty_input_yields_zeroed_summary() {
        let report = analyze(&[], &DefectWeights::default());
        assert_eq!(report.total_files, 0);
        assert_eq!(report.average_probability, 0.0);
    }

    #[test]
    fn over_range_duplication_is_capped_before_scoring() {
        let weights = DefectWeights::default();
        let report = analyze(&[metrics(0.0, 0.0, 1.5, 0.0)], &weights);
        assert!(report.scores[0].probability <= weights.duplication + 1e-9);
    }
}
