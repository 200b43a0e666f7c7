//! Report rendering: JSON via `serde_json`, table via `writeln!`-built
//! buffers, grounded in the teacher's `formatting_helpers` pattern of one
//! `format_*` function per report section.

use super::OutputFormat;
use crate::engines::{cohesion::CohesionReport, coupling::CouplingReport, defect::DefectReport, duplicates::CloneReport, hotspot::HotspotReport, risk::RiskReport, smells::SmellReport};
use crate::engines::FullReport;
use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;

pub trait Render {
    fn to_table(&self) -> String;
}

pub fn render<T: Serialize + Render>(report: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Table => print!("{}", report.to_table()),
    }
    Ok(())
}

impl Render for RiskReport {
    fn to_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Change-Risk Report");
        let _ = writeln!(
            out,
            "  commits: {}  fixes: {}  p50: {:.3}  p95: {:.3}",
            self.commits.len(),
            self.fix_count,
            self.p50,
            self.p95
        );
        let _ = writeln!(
            out,
            "  risk bands: high={} medium={} low={}",
            self.high_count, self.medium_count, self.low_count
        );
        for c in self.commits.iter().filter(|c| c.risk_level == crate::model::RiskLevel::High).take(20) {
            let _ = writeln!(out, "  HIGH  {}  score={:.3}  {}", &c.hash[..c.hash.len().min(10)], c.score, c.message);
        }
        out
    }
}

impl Render for CouplingReport {
    fn to_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Temporal Coupling Report ({} pairs)", self.pairs.len());
        for p in self.pairs.iter().take(30) {
            let _ = writeln!(
                out,
                "  {} <-> {}  strength={:.2}  cochanges={}",
                p.pair.file_a, p.pair.file_b, p.strength, p.cochanges
            );
        }
        out
    }
}

impl Render for HotspotReport {
    fn to_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Hotspot Report ({} files)", self.hotspots.len());
        let mut sorted = self.hotspots.clone();
        sorted.sort_by(|a, b| b.hotspot_score.partial_cmp(&a.hotspot_score).unwrap_or(std::cmp::Ordering::Equal));
        for h in sorted.iter().take(30) {
            let _ = writeln!(
                out,
                "  {:<40} score={:.3}  churn={:.2}  complexity={:.2}",
                h.path, h.hotspot_score, h.churn_score, h.complexity_score
            );
        }
        out
    }
}

impl Render for CloneReport {
    fn to_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Duplicate Report: {} groups, {:.1}% duplication",
            self.summary.clone_groups,
            self.summary.duplication_ratio * 100.0
        );
        for h in self.hotspots.iter().take(30) {
            let _ = writeln!(out, "  {:<40} severity={:.2}  clones={}", h.path, h.severity, h.clone_count);
        }
        out
    }
}

impl Render for CohesionReport {
    fn to_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Cohesion Report ({} classes)", self.classes.len());
        for c in self.classes.iter().take(30) {
            let _ = writeln!(
                out,
                "  {:<30} lcom4={}  dit={}  noc={}",
                c.name, c.lcom4, c.dit, c.noc
            );
        }
        out
    }
}

impl Render for SmellReport {
    fn to_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Dependency Smells: cyclic={} god={} hub={} unstable={}",
            self.cyclic_count, self.god_count, self.hub_count, self.unstable_count
        );
        for s in &self.smells {
            let _ = writeln!(out, "  [{:?}/{:?}] {}", s.kind, s.severity, s.description);
        }
        out
    }
}

impl Render for DefectReport {
    fn to_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Defect Probability Report: {} files  avg={:.3}  p50={:.3}  p95={:.3}",
            self.total_files, self.average_probability, self.p50, self.p95
        );
        for s in self.scores.iter().take(30) {
            let _ = writeln!(out, "  {:<40} p={:.3}  [{:?}]", s.path, s.probability, s.risk_level);
            for r in &s.recommendations {
                let _ = writeln!(out, "      - {r}");
            }
        }
        out
    }
}

impl Render for FullReport {
    fn to_table(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.risk.to_table());
        out.push('\n');
        out.push_str(&self.coupling.to_table());
        out.push('\n');
        out.push_str(&self.hotspots.to_table());
        out.push('\n');
        out.push_str(&self.duplicates.to_table());
        out.push('\n');
        out.push_str(&self.cohesion.to_table());
        out
    }
}
