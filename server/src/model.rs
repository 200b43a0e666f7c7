//! Shared record types that flow between engines, per the data model.
//!
//! These are plain data — no behavior beyond small constructors and the
//! occasional derived accessor. Each engine module owns the records specific
//! to its own output (e.g. `engines::duplicates::CloneReport`); this module
//! holds the ones referenced across more than one engine.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            RiskLevel::High
        } else if score >= 0.3 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

/// One file's involvement in a single commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub added: u64,
    pub deleted: u64,
}

/// Raw per-commit data as read off the VCS facade, before feature derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCommit {
    pub hash: String,
    pub author: String,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub files: Vec<FileChange>,
}

/// Per-commit features derived by the change-risk engine's chronological replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitFeatures {
    pub hash: String,
    pub author: String,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub num_files: u64,
    pub num_developers: u64,
    pub unique_changes: u64,
    pub author_experience: u64,
    pub entropy: f64,
    pub is_fix: bool,
    pub is_automated: bool,
    pub files_modified: Vec<String>,
}

/// A scored commit, as returned to callers of the change-risk engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRisk {
    pub hash: String,
    pub author: String,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub score: f64,
    pub risk_level: RiskLevel,
    pub is_fix: bool,
    pub is_automated: bool,
}

/// Per-analysis maxima used to normalize raw feature values; each floor is 1
/// so that dividing by it never panics or inflates a ratio past sane bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub max_entropy: f64,
    pub max_lines_added: f64,
    pub max_lines_deleted: f64,
    pub max_num_files: f64,
    pub max_unique_changes: f64,
    pub max_num_developers: f64,
    pub max_author_experience: f64,
}

impl NormalizationStats {
    pub fn from_commits(commits: &[CommitFeatures]) -> Self {
        let max_of = |f: fn(&CommitFeatures) -> f64| -> f64 {
            commits
                .iter()
                .map(f)
                .fold(0.0_f64, f64::max)
                .max(1.0)
        };
        Self {
            max_entropy: max_of(|c| c.entropy),
            max_lines_added: max_of(|c| c.lines_added as f64),
            max_lines_deleted: max_of(|c| c.lines_deleted as f64),
            max_num_files: max_of(|c| c.num_files as f64),
            max_unique_changes: max_of(|c| c.unique_changes as f64),
            max_num_developers: max_of(|c| c.num_developers as f64),
            max_author_experience: max_of(|c| c.author_experience as f64),
        }
    }
}

/// Per-file churn accumulated across the lookback window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChurn {
    pub path: String,
    pub additions: u64,
    pub deletions: u64,
    pub commits: u64,
    pub unique_authors: u64,
    pub last_changed: chrono::DateTime<chrono::Utc>,
    pub churn_score: f64,
}

/// An unordered pair of files, always stored with `file_a < file_b`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FilePair {
    pub file_a: String,
    pub file_b: String,
}

impl FilePair {
    /// Canonicalizes the pair so `file_a < file_b` lexicographically.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        match a.cmp(&b) {
            Ordering::Less | Ordering::Equal => FilePair { file_a: a, file_b: b },
            Ordering::Greater => FilePair { file_a: b, file_b: a },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoupledPair {
    pub pair: FilePair,
    pub cochanges: u64,
    pub commits_a: u64,
    pub commits_b: u64,
    pub strength: f64,
}

/// Per-file complexity produced by averaging the complexity kernel over a
/// file's functions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FunctionComplexity {
    pub cyclomatic: u32,
    pub cognitive: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileComplexity {
    pub path: String,
    pub avg_cyclomatic: f64,
    pub avg_cognitive: f64,
    pub function_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotspot {
    pub path: String,
    pub commits: u64,
    pub avg_cognitive: f64,
    pub avg_cyclomatic: f64,
    pub churn_score: f64,
    pub complexity_score: f64,
    pub hotspot_score: f64,
    pub function_count: u64,
}

/// A MinHash signature: a fixed-length vector of minimized hash slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MinHashSignature(pub Vec<u64>);

impl MinHashSignature {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Jaccard estimate: fraction of slots that agree between two signatures
    /// of equal length.
    pub fn jaccard(&self, other: &MinHashSignature) -> f64 {
        debug_assert_eq!(self.0.len(), other.0.len());
        if self.0.is_empty() {
            return 0.0;
        }
        let matches = self
            .0
            .iter()
            .zip(other.0.iter())
            .filter(|(a, b)| a == b)
            .count();
        matches as f64 / self.0.len() as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeFragment {
    pub id: usize,
    pub path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub token_count: usize,
    pub signature: MinHashSignature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloneType {
    Type1,
    Type2,
    Type3,
}

impl CloneType {
    pub fn classify(similarity: f64) -> Self {
        if similarity >= 0.95 {
            CloneType::Type1
        } else if similarity >= 0.85 {
            CloneType::Type2
        } else {
            CloneType::Type3
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneEdge {
    pub fragment_a: usize,
    pub fragment_b: usize,
    pub similarity: f64,
    pub clone_type: CloneType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneGroup {
    pub id: usize,
    pub fragment_ids: Vec<usize>,
    pub average_similarity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicationHotspot {
    pub path: String,
    pub severity: f64,
    pub clone_count: usize,
}

/// A method's name plus the instance fields it reads or writes, used by the
/// cohesion engine to build the method-field graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub used_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    pub language: String,
    pub path: String,
    pub fields: Vec<String>,
    pub methods: Vec<MethodInfo>,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    pub language: String,
    pub path: String,
    pub fields: Vec<String>,
    pub methods: Vec<MethodInfo>,
    pub parents: Vec<String>,
    pub lcom4: usize,
    pub dit: usize,
    pub noc: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmellKind {
    CyclicDependency,
    HubLikeDependency,
    GodComponent,
    UnstableDependency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencySmell {
    pub kind: SmellKind,
    pub severity: Severity,
    pub components: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyNode {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: Vec<DependencyNode>,
    pub edges: Vec<DependencyEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentMetrics {
    pub id: String,
    pub fan_in: usize,
    pub fan_out: usize,
    pub instability: f64,
}

/// Aggregate per-file metrics consumed by the defect-probability aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetrics {
    pub path: String,
    pub churn_score: f64,
    pub complexity: f64,
    pub duplicate_ratio: f64,
    pub cyclomatic_complexity: f64,
    pub coupling: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectScore {
    pub path: String,
    pub probability: f64,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_pair_canonicalizes() {
        let p = FilePair::new("b.rs", "a.rs");
        assert_eq!(p.file_a, "a.rs");
        assert_eq!(p.file_b, "b.rs");
    }

    #[test]
    fn risk_level_bands() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.29), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.3), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.69), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.7), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(1.0), RiskLevel::High);
    }

    #[test]
    fn clone_type_thresholds() {
        assert_eq!(CloneType::classify(1.0), CloneType::Type1);
        assert_eq!(CloneType::classify(0.95), CloneType::Type1);
        assert_eq!(CloneType::classify(0.9), CloneType::Type2);
        assert_eq!(CloneType::classify(0.85), CloneType::Type2);
        assert_eq!(CloneType::classify(0.7), CloneType::Type3);
    }

    #[test]
    fn signature_jaccard_identical() {
        let sig = MinHashSignature(vec![1, 2, 3, 4]);
        assert_eq!(sig.jaccard(&sig.clone()), 1.0);
    }
}
