//! The nine analytical engines (spec §4), plus the combined report used by
//! the CLI's `report` subcommand.

pub mod churn;
pub mod cohesion;
pub mod complexity;
pub mod coupling;
pub mod defect;
pub mod duplicates;
pub mod hotspot;
pub mod risk;
pub mod smells;

use crate::cancel::CancellationToken;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::vcs::VcsRepo;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything the `report` subcommand needs from one pass over a repository:
/// every engine's output folded into a single document (spec's "run
/// everything, emit one document" supplement).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullReport {
    pub risk: risk::RiskReport,
    pub coupling: coupling::CouplingReport,
    pub hotspots: hotspot::HotspotReport,
    pub duplicates: duplicates::CloneReport,
    pub cohesion: cohesion::CohesionReport,
}

pub fn run_full_report(
    repo: &dyn VcsRepo,
    source_files: &[std::path::PathBuf],
    config: &AnalysisConfig,
    cancel: &CancellationToken,
    reference_time: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<FullReport> {
    let risk = risk::analyze(repo, config, cancel, reference_time)?;
    let coupling = coupling::analyze(repo, config, cancel, reference_time)?;
    let churn = churn::analyze(repo, config, cancel, reference_time)?;
    let complexity = complexity::analyze_files(source_files)?;
    let hotspots = hotspot::analyze(&churn, &complexity);
    let duplicates = duplicates::analyze(source_files, &config.duplicate, cancel)?;
    let cohesion = cohesion::analyze(source_files)?;

    Ok(FullReport {
        risk,
        coupling,
        hotspots,
        duplicates,
        cohesion,
    })
}

pub(crate) fn language_tag(path: &Path) -> crate::parser::Language {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    crate::parser::Language::from_extension(ext)
}
