//! Typed rule blocks with documented fallback defaults.
//!
//! Each block derives `Deserialize` with struct-level `#[serde(default)]`
//! so a partially specified YAML file overrides only the keys it names.
//! The `Default` impls are the single source of the documented fallbacks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::enums::RiskLevel;

// ---------------------------------------------------------------------------
// Time rules
// ---------------------------------------------------------------------------

/// `time_rules.yaml`: anchor resolution weights, time-dimension scoring,
/// scan-round triggers and budgets, and the anchor-minimum profile used by
/// risk degrade decisions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeRules {
    pub anchor_min_profile: AnchorMinProfile,
    pub time_score_weights: TimeScoreWeights,
    pub anchor_weights: AnchorWeights,
    pub round_triggers: RoundTriggerRules,
    pub scan_budgets: ScanBudgetRules,
}

/// Minimum anchoring profile: when met, G5/G6 degrade less harshly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorMinProfile {
    pub min_in_period_highmed: u32,
    pub max_unknown_time: u32,
    pub min_time_score: f64,
    pub min_mapping_score: f64,
    pub min_loop_score: f64,
    pub min_verif_score: f64,
}

impl Default for AnchorMinProfile {
    fn default() -> Self {
        Self {
            min_in_period_highmed: 8,
            max_unknown_time: 8,
            min_time_score: 45.0,
            min_mapping_score: 85.0,
            min_loop_score: 45.0,
            min_verif_score: 85.0,
        }
    }
}

/// Time dimension score coefficients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeScoreWeights {
    pub base: f64,
    pub in_period_highmed: f64,
    pub in_period_low: f64,
    pub unknown_penalty: f64,
    pub contradiction_penalty: f64,
    pub out_period_penalty: f64,
}

impl Default for TimeScoreWeights {
    fn default() -> Self {
        Self {
            base: 40.0,
            in_period_highmed: 45.0,
            in_period_low: 15.0,
            unknown_penalty: 35.0,
            contradiction_penalty: 20.0,
            out_period_penalty: 10.0,
        }
    }
}

/// Candidate arbitration weights for the anchor resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorWeights {
    pub channel_review: f64,
    pub channel_order: f64,
    pub channel_logistics: f64,
    pub channel_base: f64,
    pub in_period_bonus: f64,
    pub out_period_penalty: f64,
    pub type_transaction_bonus: f64,
    pub type_content_bonus: f64,
    pub type_system_bonus: f64,
    pub type_uncertain_penalty: f64,
    pub noise_penalty: f64,
    /// How many ranked candidates the anchor retains.
    pub top_k: usize,
    /// Container-metadata dates are only accepted within this many days
    /// of the defined period's boundaries.
    pub metadata_window_days: i64,
    /// Formation-vs-anchor gaps beyond this margin on both sides count
    /// as a cross-period contradiction.
    pub contradiction_margin_days: i64,
}

impl Default for AnchorWeights {
    fn default() -> Self {
        Self {
            channel_review: 3.0,
            channel_order: 2.0,
            channel_logistics: 2.0,
            channel_base: 1.0,
            in_period_bonus: 2.0,
            out_period_penalty: 1.5,
            type_transaction_bonus: 1.5,
            type_content_bonus: 0.8,
            type_system_bonus: 0.3,
            type_uncertain_penalty: 1.0,
            noise_penalty: 2.5,
            top_k: 5,
            metadata_window_days: 30,
            contradiction_margin_days: 30,
        }
    }
}

/// Round 3-5 trigger ratios and the per-document signal floor.
///
/// A later round fires when the fraction of documents whose signal score
/// falls below `signal_floor` exceeds the round's ratio (or a required
/// case field is still missing). Ratios shrink per round; the fast ladder
/// is the more permissive one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundTriggerRules {
    /// Weak-document ratios for rounds 3, 4, 5 in full mode.
    pub full_ratios: [f64; 3],
    /// Weak-document ratios for rounds 3, 4, 5 in fast mode.
    pub fast_ratios: [f64; 3],
    /// Signal score below this marks a document as weak.
    pub signal_floor: f64,
}

impl Default for RoundTriggerRules {
    fn default() -> Self {
        Self {
            full_ratios: [0.55, 0.40, 0.30],
            fast_ratios: [0.45, 0.30, 0.22],
            signal_floor: 0.45,
        }
    }
}

/// Page/resolution budgets per scan round, plus re-scan subset caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanBudgetRules {
    /// Round 1 budget for notice/fact-like documents.
    pub notice_pages: u32,
    pub notice_dpi: u32,
    /// Round 2 baseline budget for everything.
    pub base_pages: u32,
    pub base_dpi: u32,
    /// Budgets for conditional rounds 3, 4, 5 (pages, dpi), rising.
    pub deep_pages: [u32; 3],
    pub deep_dpi: [u32; 3],
    /// Maximum documents a conditional round may re-scan.
    pub rescan_cap: usize,
    /// Separate cap for the weak generic-image category so it cannot
    /// crowd out structured candidates.
    pub weak_cap: usize,
}

impl Default for ScanBudgetRules {
    fn default() -> Self {
        Self {
            notice_pages: 6,
            notice_dpi: 340,
            base_pages: 2,
            base_dpi: 320,
            deep_pages: [4, 6, 8],
            deep_dpi: [340, 360, 380],
            rescan_cap: 12,
            weak_cap: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Score rules
// ---------------------------------------------------------------------------

/// `score_rules.yaml`: dimension score coefficients and reason-chain
/// element scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreRules {
    pub mapping_score_weights: MappingScoreWeights,
    pub loop_score_weights: LoopScoreWeights,
    pub verifiability_score_weights: VerifiabilityScoreWeights,
    pub element_scoring: ElementScoring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingScoreWeights {
    pub base: f64,
    pub per_target: f64,
    pub goods_ratio_bonus: f64,
}

impl Default for MappingScoreWeights {
    fn default() -> Self {
        Self {
            base: 30.0,
            per_target: 10.0,
            goods_ratio_bonus: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopScoreWeights {
    pub base: f64,
    pub loop_ratio_bonus: f64,
    pub mark_ratio_bonus: f64,
    pub subject_ratio_bonus: f64,
    /// The weak-loop proxy (min of mark, subject, scene-coverage and
    /// in-period-high/medium counts) must reach this for a zero-loop case
    /// to escape the penalty and gate G5.
    pub weak_loop_proxy_min: u32,
    pub weak_loop_penalty: f64,
}

impl Default for LoopScoreWeights {
    fn default() -> Self {
        Self {
            base: 45.0,
            loop_ratio_bonus: 30.0,
            mark_ratio_bonus: 15.0,
            subject_ratio_bonus: 10.0,
            weak_loop_proxy_min: 6,
            weak_loop_penalty: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifiabilityScoreWeights {
    pub base: f64,
    pub verifiable_ratio_bonus: f64,
    pub contradiction_penalty: f64,
}

impl Default for VerifiabilityScoreWeights {
    fn default() -> Self {
        Self {
            base: 25.0,
            verifiable_ratio_bonus: 70.0,
            contradiction_penalty: 15.0,
        }
    }
}

/// Reason-chain element scoring: score = min(max_element_score,
/// evidence_count * per_evidence_score + element_weight).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementScoring {
    /// Per-target base weight, keyed by lowercase target code (t1..t6).
    pub element_weight: HashMap<String, u32>,
    pub per_evidence_score: u32,
    pub max_element_score: u32,
}

impl Default for ElementScoring {
    fn default() -> Self {
        let element_weight = ["t1", "t2", "t3", "t4", "t5", "t6"]
            .into_iter()
            .map(|t| (t.to_string(), 10))
            .collect();
        Self {
            element_weight,
            per_evidence_score: 5,
            max_element_score: 100,
        }
    }
}

impl ElementScoring {
    pub fn weight_for(&self, code: &str) -> u32 {
        self.element_weight
            .get(&code.to_ascii_lowercase())
            .copied()
            .unwrap_or(10)
    }
}

// ---------------------------------------------------------------------------
// Risk rules
// ---------------------------------------------------------------------------

/// `risk_rules.yaml`: the A-E ladder, gate degrade behavior, decision
/// wording, and the reason-chain pass threshold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskRules {
    pub risk_level_thresholds: RiskLevelThresholds,
    pub anchor_degrade: AnchorDegrade,
    pub hard_fail_level: HardFailLevel,
    pub decision_text: HashMap<String, String>,
    pub pass_min_elements: PassMinElements,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLevelThresholds {
    pub avg_a_min: f64,
    pub min_dim_a_min: f64,
    pub avg_b_min: f64,
    pub avg_c_min: f64,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            avg_a_min: 85.0,
            min_dim_a_min: 75.0,
            avg_b_min: 68.0,
            avg_c_min: 55.0,
        }
    }
}

/// Degraded tiers applied when G5/G6 fire, modulated by whether the
/// anchor-minimum profile is met.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorDegrade {
    pub both_g5_g6_if_anchor_ok: RiskLevel,
    pub both_g5_g6_if_anchor_not_ok: RiskLevel,
    pub one_of_g5_g6_if_anchor_ok: RiskLevel,
    pub one_of_g5_g6_if_anchor_not_ok: RiskLevel,
}

impl Default for AnchorDegrade {
    fn default() -> Self {
        Self {
            both_g5_g6_if_anchor_ok: RiskLevel::C,
            both_g5_g6_if_anchor_not_ok: RiskLevel::D,
            one_of_g5_g6_if_anchor_ok: RiskLevel::B,
            one_of_g5_g6_if_anchor_not_ok: RiskLevel::C,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HardFailLevel(pub RiskLevel);

impl Default for HardFailLevel {
    fn default() -> Self {
        Self(RiskLevel::E)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassMinElements(pub u32);

impl Default for PassMinElements {
    fn default() -> Self {
        Self(3)
    }
}

impl RiskRules {
    /// Decision wording for a level: configured text, else the built-in
    /// fallback.
    pub fn decision_for(&self, level: RiskLevel) -> String {
        self.decision_text
            .get(level.as_str())
            .cloned()
            .unwrap_or_else(|| level.default_decision().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let time = TimeRules::default();
        assert_eq!(time.time_score_weights.in_period_highmed, 45.0);
        assert_eq!(time.anchor_weights.top_k, 5);
        assert_eq!(time.anchor_weights.metadata_window_days, 30);
        assert_eq!(time.round_triggers.full_ratios, [0.55, 0.40, 0.30]);
        assert_eq!(time.round_triggers.fast_ratios, [0.45, 0.30, 0.22]);
        assert_eq!(time.scan_budgets.notice_pages, 6);
        assert_eq!(time.scan_budgets.base_dpi, 320);

        let score = ScoreRules::default();
        assert_eq!(score.mapping_score_weights.per_target, 10.0);
        assert_eq!(score.loop_score_weights.weak_loop_proxy_min, 6);
        assert_eq!(score.verifiability_score_weights.verifiable_ratio_bonus, 70.0);
        assert_eq!(score.element_scoring.per_evidence_score, 5);

        let risk = RiskRules::default();
        assert_eq!(risk.risk_level_thresholds.avg_c_min, 55.0);
        assert_eq!(risk.hard_fail_level.0, RiskLevel::E);
        assert_eq!(risk.anchor_degrade.one_of_g5_g6_if_anchor_ok, RiskLevel::B);
        assert_eq!(risk.pass_min_elements.0, 3);
    }

    #[test]
    fn element_weight_lookup_handles_case_and_missing() {
        let scoring = ElementScoring::default();
        assert_eq!(scoring.weight_for("T3"), 10);
        assert_eq!(scoring.weight_for("t9"), 10); // unknown code → neutral weight
    }

    #[test]
    fn decision_text_falls_back() {
        let mut risk = RiskRules::default();
        assert_eq!(risk.decision_for(RiskLevel::A), "ready to submit");
        risk.decision_text
            .insert("A".into(), "file immediately".into());
        assert_eq!(risk.decision_for(RiskLevel::A), "file immediately");
    }

    #[test]
    fn partial_yaml_block_deserializes() {
        let time: TimeRules =
            serde_yaml::from_str("anchor_weights:\n  top_k: 3\n").unwrap();
        assert_eq!(time.anchor_weights.top_k, 3);
        assert_eq!(time.anchor_weights.channel_review, 3.0);
        assert_eq!(time.scan_budgets.rescan_cap, 12);
    }
}
