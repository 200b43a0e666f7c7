//! Hotspot engine (spec §4.4): joins per-file churn with per-function
//! complexity averages via CDF-normalized geometric mean.

use crate::engines::churn::ChurnReport;
use crate::model::{FileComplexity, Hotspot};
use crate::stats::{normalize_churn_cdf, normalize_complexity_cdf};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotReport {
    pub hotspots: Vec<Hotspot>,
}

pub fn analyze(churn: &ChurnReport, complexity: &[FileComplexity]) -> HotspotReport {
    let complexity_by_path: HashMap<&str, &FileComplexity> =
        complexity.iter().map(|c| (c.path.as_str(), c)).collect();

    let mut hotspots: Vec<Hotspot> = churn
        .files
        .iter()
        .map(|file| {
            let complexity = complexity_by_path.get(file.path.as_str());
            let avg_cognitive = complexity.map(|c| c.avg_cognitive).unwrap_or(0.0);
            let avg_cyclomatic = complexity.map(|c| c.avg_cyclomatic).unwrap_or(0.0);
            let function_count = complexity.map(|c| c.function_count).unwrap_or(0);

            let churn_score = normalize_churn_cdf(file.commits as f64);
            let complexity_score = normalize_complexity_cdf(avg_cognitive);
            let hotspot_score = (churn_score * complexity_score).sqrt();

            Hotspot {
                path: file.path.clone(),
                commits: file.commits,
                avg_cognitive,
                avg_cyclomatic,
                churn_score,
                complexity_score,
                hotspot_score,
                function_count,
            }
        })
        .collect();

    hotspots.sort_by(|a, b| {
        b.hotspot_score
            .partial_cmp(&a.hotspot_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    HotspotReport { hotspots }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileChurn;
    use chrono::Utc;

    #[test]
    fn geometric_mean_requires_both_axes_elevated() {
        let churn = ChurnReport {
            files: vec![
                FileChurn {
                    path: "hot.rs".into(),
                    additions: 100,
                    deletions: 50,
                    commits: 50,
                    unique_authors: 3,
                    last_changed: Utc::now(),
                    churn_score: 0.0,
                },
                FileChurn {
                    path: "churny_simple.rs".into(),
                    additions: 100,
                    deletions: 50,
                    commits: 50,
                    unique_authors: 3,
                    last_changed: Utc::now(),
                    churn_score: 0.0,
                },
            ],
        };
        let complexity = vec![
            FileComplexity {
                path: "hot.rs".into(),
                avg_cyclomatic: 20.0,
                avg_cognitive: 25.0,
                function_count: 5,
            },
            FileComplexity {
                path: "churny_simple.rs".into(),
                avg_cyclomatic: 1.0,
                avg_cognitive: 0.0,
                function_count: 5,
            },
        ];
        let report = analyze(&churn, &complexity);
        let hot = report.hotspots.iter().find(|h| h.path == "hot.rs").unwrap();
        let simple = report
            .hotspots
            .iter()
            .find(|h| h.path == "churny_simple.rs")
            .unwrap();
        assert!(hot.hotspot_score > simple.hotspot_score);
        assert_eq!(simple.hotspot_score, 0.0);
    }

    #[test]
    fn missing_complexity_defaults_to_zero() {
        let churn = ChurnReport {
            files: vec![FileChurn {
                path: "unparsed.rs".into(),
                additions: 10,
                deletions: 5,
                commits: 5,
                unique_authors: 1,
                last_changed: Utc::now(),
                churn_score: 0.0,
            }],
        };
        let report = analyze(&churn, &[]);
        assert_eq!(report.hotspots[0].avg_cognitive, 0.0);
    }
}
