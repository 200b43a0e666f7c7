//! Analysis configuration, loaded from `codelens.toml` and overridable by CLI flags.
//!
//! Follows the teacher's `DeepContextConfig` pattern: `#[serde(default = "...")]`
//! per field, a `validate()` that returns every violation found (not just the
//! first), and a `load_from_file` that validates before handing the config back.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRiskWeights {
    #[serde(default = "w_fix")]
    pub fix: f64,
    #[serde(default = "w_entropy")]
    pub entropy: f64,
    #[serde(default = "w_la")]
    pub la: f64,
    #[serde(default = "w_ld")]
    pub ld: f64,
    #[serde(default = "w_nf")]
    pub nf: f64,
    #[serde(default = "w_nuc")]
    pub nuc: f64,
    #[serde(default = "w_ndev")]
    pub ndev: f64,
    #[serde(default = "w_exp")]
    pub exp: f64,
}

fn w_fix() -> f64 {
    0.15
}
fn w_entropy() -> f64 {
    0.10
}
fn w_la() -> f64 {
    0.15
}
fn w_ld() -> f64 {
    0.10
}
fn w_nf() -> f64 {
    0.15
}
fn w_nuc() -> f64 {
    0.15
}
fn w_ndev() -> f64 {
    0.10
}
fn w_exp() -> f64 {
    0.10
}

impl Default for ChangeRiskWeights {
    fn default() -> Self {
        Self {
            fix: w_fix(),
            entropy: w_entropy(),
            la: w_la(),
            ld: w_ld(),
            nf: w_nf(),
            nuc: w_nuc(),
            ndev: w_ndev(),
            exp: w_exp(),
        }
    }
}

impl ChangeRiskWeights {
    fn iter(&self) -> [f64; 8] {
        [
            self.fix,
            self.entropy,
            self.la,
            self.ld,
            self.nf,
            self.nuc,
            self.ndev,
            self.exp,
        ]
    }

    fn validate(&self, errors: &mut Vec<String>) {
        for w in self.iter() {
            if !(0.0..=1.0).contains(&w) {
                errors.push(format!("change-risk weight {w} is outside [0,1]"));
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateConfig {
    #[serde(default = "default_min_tokens")]
    pub min_tokens: usize,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_shingle_size")]
    pub shingle_size: usize,
    #[serde(default = "default_num_hash_functions")]
    pub num_hash_functions: usize,
    #[serde(default = "default_num_bands")]
    pub num_bands: usize,
    #[serde(default = "default_rows_per_band")]
    pub rows_per_band: usize,
    #[serde(default = "default_true")]
    pub normalize_identifiers: bool,
    #[serde(default = "default_true")]
    pub normalize_literals: bool,
    #[serde(default = "default_true")]
    pub ignore_comments: bool,
    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,
    #[serde(default)]
    pub max_file_size: u64,
}

fn default_min_tokens() -> usize {
    50
}
fn default_similarity_threshold() -> f64 {
    0.70
}
fn default_shingle_size() -> usize {
    5
}
fn default_num_hash_functions() -> usize {
    200
}
fn default_num_bands() -> usize {
    20
}
fn default_rows_per_band() -> usize {
    10
}
fn default_true() -> bool {
    true
}
fn default_min_group_size() -> usize {
    2
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            min_tokens: default_min_tokens(),
            similarity_threshold: default_similarity_threshold(),
            shingle_size: default_shingle_size(),
            num_hash_functions: default_num_hash_functions(),
            num_bands: default_num_bands(),
            rows_per_band: default_rows_per_band(),
            normalize_identifiers: true,
            normalize_literals: true,
            ignore_comments: true,
            min_group_size: default_min_group_size(),
            max_file_size: 0,
        }
    }
}

impl DuplicateConfig {
    fn validate(&self, errors: &mut Vec<String>) {
        if self.num_bands * self.rows_per_band != self.num_hash_functions {
            errors.push(format!(
                "num_bands * rows_per_band ({} * {} = {}) must equal num_hash_functions ({})",
                self.num_bands,
                self.rows_per_band,
                self.num_bands * self.rows_per_band,
                self.num_hash_functions
            ));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            errors.push(format!(
                "similarity_threshold {} is outside [0,1]",
                self.similarity_threshold
            ));
        }
        if self.shingle_size == 0 {
            errors.push("shingle_size must be >= 1".to_string());
        }
        if self.min_group_size < 2 {
            errors.push("min_group_size must be >= 2".to_string());
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmellThresholds {
    #[serde(default = "default_god_fan_in")]
    pub god_fan_in: usize,
    #[serde(default = "default_god_fan_out")]
    pub god_fan_out: usize,
    #[serde(default = "default_hub")]
    pub hub_threshold: usize,
    #[serde(default = "default_stable")]
    pub stable_threshold: f64,
    #[serde(default = "default_unstable")]
    pub unstable_threshold: f64,
}

fn default_god_fan_in() -> usize {
    10
}
fn default_god_fan_out() -> usize {
    10
}
fn default_hub() -> usize {
    20
}
fn default_stable() -> f64 {
    0.3
}
fn default_unstable() -> f64 {
    0.7
}

impl Default for SmellThresholds {
    fn default() -> Self {
        Self {
            god_fan_in: default_god_fan_in(),
            god_fan_out: default_god_fan_out(),
            hub_threshold: default_hub(),
            stable_threshold: default_stable(),
            unstable_threshold: default_unstable(),
        }
    }
}

impl SmellThresholds {
    fn validate(&self, errors: &mut Vec<String>) {
        if !(0.0..=1.0).contains(&self.stable_threshold) {
            errors.push("stable_threshold must be in [0,1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.unstable_threshold) {
            errors.push("unstable_threshold must be in [0,1]".to_string());
        }
        if self.stable_threshold > self.unstable_threshold {
            errors.push("stable_threshold must be <= unstable_threshold".to_string());
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectWeights {
    #[serde(default = "dw_churn")]
    pub churn: f64,
    #[serde(default = "dw_complexity")]
    pub complexity: f64,
    #[serde(default = "dw_duplication")]
    pub duplication: f64,
    #[serde(default = "dw_coupling")]
    pub coupling: f64,
}

fn dw_churn() -> f64 {
    0.35
}
fn dw_complexity() -> f64 {
    0.30
}
fn dw_duplication() -> f64 {
    0.25
}
fn dw_coupling() -> f64 {
    0.10
}

impl Default for DefectWeights {
    fn default() -> Self {
        Self {
            churn: dw_churn(),
            complexity: dw_complexity(),
            duplication: dw_duplication(),
            coupling: dw_coupling(),
        }
    }
}

impl DefectWeights {
    fn validate(&self, errors: &mut Vec<String>) {
        for (name, w) in [
            ("churn", self.churn),
            ("complexity", self.complexity),
            ("duplication", self.duplication),
            ("coupling", self.coupling),
        ] {
            if !(0.0..=1.0).contains(&w) {
                errors.push(format!("defect weight {name} ({w}) is outside [0,1]"));
            }
        }
    }
}

/// Top-level analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    #[serde(default = "default_churn_days")]
    pub churn_days: u32,
    #[serde(default = "default_min_cochanges")]
    pub min_cochanges: usize,
    #[serde(default)]
    pub risk_weights: ChangeRiskWeights,
    #[serde(default)]
    pub duplicate: DuplicateConfig,
    #[serde(default)]
    pub smells: SmellThresholds,
    #[serde(default)]
    pub defect_weights: DefectWeights,
}

fn default_lookback_days() -> i64 {
    90
}
fn default_churn_days() -> u32 {
    90
}
fn default_min_cochanges() -> usize {
    2
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            churn_days: default_churn_days(),
            min_cochanges: default_min_cochanges(),
            risk_weights: ChangeRiskWeights::default(),
            duplicate: DuplicateConfig::default(),
            smells: SmellThresholds::default(),
            defect_weights: DefectWeights::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.lookback_days < 0 {
            errors.push(format!(
                "lookback_days must be non-negative, got {}",
                self.lookback_days
            ));
        }
        self.risk_weights.validate(&mut errors);
        self.duplicate.validate(&mut errors);
        self.smells.validate(&mut errors);
        self.defect_weights.validate(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| AnalysisError::InvariantViolation(e.to_string()))?;
        config
            .validate()
            .map_err(|errs| AnalysisError::InvariantViolation(errs.join("; ")))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_mismatched_bands() {
        let mut cfg = AnalysisConfig::default();
        cfg.duplicate.num_bands = 7;
        let errs = cfg.validate().unwrap_err();
        assert!(errs.iter().any(|e| e.contains("num_bands")));
    }

    #[test]
    fn rejects_negative_lookback() {
        let mut cfg = AnalysisConfig::default();
        cfg.lookback_days = -1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_weight() {
        let mut cfg = AnalysisConfig::default();
        cfg.defect_weights.churn = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn roundtrips_through_toml() {
        let cfg = AnalysisConfig::default();
        let text = toml::to_string(&cfg).unwrap();
        let back: AnalysisConfig = toml::from_str(&text).unwrap();
        assert_eq!(cfg.lookback_days, back.lookback_days);
    }
}
