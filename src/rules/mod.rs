//! Externalized rule profile: every numeric weight, threshold, and ratio
//! the engine consumes is injected from here at run start, never compiled
//! in. Three named blocks (time, scoring, risk) load from YAML files;
//! any missing file or key falls back to the documented default and the
//! run continues.

pub mod lexicons;
pub mod profile;

pub use lexicons::Lexicons;
pub use profile::{
    AnchorDegrade, AnchorMinProfile, AnchorWeights, LoopScoreWeights, MappingScoreWeights,
    RiskLevelThresholds, RiskRules, RoundTriggerRules, ScanBudgetRules, ScoreRules,
    TimeRules, TimeScoreWeights, VerifiabilityScoreWeights,
};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Failed to read rule file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where one rule block came from, for the audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSource {
    pub key: String,
    pub path: String,
    /// SHA-256 of the file content; empty when defaults were used.
    pub sha256: String,
    pub loaded: bool,
}

/// The full profile handed to the engine at run start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleProfile {
    pub time: TimeRules,
    pub scoring: ScoreRules,
    pub risk: RiskRules,
    #[serde(default)]
    pub sources: Vec<RuleSource>,
}

impl RuleProfile {
    /// Load the three rule blocks from `dir` (`time_rules.yaml`,
    /// `score_rules.yaml`, `risk_rules.yaml`).
    ///
    /// A missing or unparseable file degrades that block to its defaults
    /// with a warning; rule loading can never abort a run.
    pub fn load(dir: &Path) -> RuleProfile {
        let mut sources = Vec::with_capacity(3);
        let time = load_block(dir, "time_rules.yaml", "time_rules", &mut sources);
        let scoring = load_block(dir, "score_rules.yaml", "score_rules", &mut sources);
        let risk = load_block(dir, "risk_rules.yaml", "risk_rules", &mut sources);
        RuleProfile {
            time,
            scoring,
            risk,
            sources,
        }
    }
}

fn load_block<T>(dir: &Path, file: &str, key: &str, sources: &mut Vec<RuleSource>) -> T
where
    T: Default + for<'de> Deserialize<'de>,
{
    let path = dir.join(file);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(
                rule_block = key,
                path = %path.display(),
                error = %e,
                "Rule file unavailable — using documented defaults"
            );
            sources.push(RuleSource {
                key: key.into(),
                path: path.display().to_string(),
                sha256: String::new(),
                loaded: false,
            });
            return T::default();
        }
    };

    let sha256 = hex_digest(raw.as_bytes());
    match serde_yaml::from_str::<T>(&raw) {
        Ok(block) => {
            sources.push(RuleSource {
                key: key.into(),
                path: path.display().to_string(),
                sha256,
                loaded: true,
            });
            block
        }
        Err(e) => {
            tracing::warn!(
                rule_block = key,
                path = %path.display(),
                error = %e,
                "Rule file unparseable — using documented defaults"
            );
            sources.push(RuleSource {
                key: key.into(),
                path: path.display().to_string(),
                sha256,
                loaded: false,
            });
            T::default()
        }
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
