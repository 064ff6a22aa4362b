//! Risk-level derivation: gates and dimension scores to the A-E ladder.
//!
//! First match wins: a missing period or zero in-period coverage is
//! fatal, as is any missing core element. The loop/verifiability gates
//! degrade rather than veto, modulated by whether the case meets the
//! anchor-minimum profile. Everything else lands on the threshold ladder
//! over the average and minimum dimension scores.

use crate::models::enums::RiskLevel;
use crate::rules::{RiskRules, TimeRules};

use super::diagnostics::{CaseDiagnostics, GateCode};

/// Whether the case meets the anchor-minimum profile: all four dimension
/// floors plus the in-period-high/medium floor and the unknown-time
/// ceiling.
pub fn meets_anchor_minimum(diag: &CaseDiagnostics, time_rules: &TimeRules) -> bool {
    let cfg = &time_rules.anchor_min_profile;
    let ds = &diag.dim_scores;
    let s = &diag.summary;
    ds.time >= cfg.min_time_score
        && ds.mapping >= cfg.min_mapping_score
        && ds.loop_ >= cfg.min_loop_score
        && ds.verifiability >= cfg.min_verif_score
        && s.in_period_highmed >= cfg.min_in_period_highmed as usize
        && s.unknown_time <= cfg.max_unknown_time as usize
}

/// Derive the overall risk level. Ordered, first match wins.
pub fn derive_risk_level(
    diag: &CaseDiagnostics,
    time_rules: &TimeRules,
    risk_rules: &RiskRules,
) -> RiskLevel {
    let gates = &diag.gates;
    let hard_fail = risk_rules.hard_fail_level.0;

    // fatal: period missing or no in-period coverage
    if gates.is_set(GateCode::G1a) || gates.is_set(GateCode::G1b) {
        return hard_fail;
    }
    // fatal: a core element has zero scored support
    if gates.is_set(GateCode::G2) || gates.is_set(GateCode::G3) || gates.is_set(GateCode::G4) {
        return hard_fail;
    }

    let anchor_ok = meets_anchor_minimum(diag, time_rules);
    let degrade = &risk_rules.anchor_degrade;
    let g5 = gates.is_set(GateCode::G5);
    let g6 = gates.is_set(GateCode::G6);

    if g5 && g6 {
        return if anchor_ok {
            degrade.both_g5_g6_if_anchor_ok
        } else {
            degrade.both_g5_g6_if_anchor_not_ok
        };
    }
    if g5 || g6 {
        return if anchor_ok {
            degrade.one_of_g5_g6_if_anchor_ok
        } else {
            degrade.one_of_g5_g6_if_anchor_not_ok
        };
    }

    let thresholds = &risk_rules.risk_level_thresholds;
    let avg = diag.dim_scores.average();
    let min = diag.dim_scores.minimum();
    if avg >= thresholds.avg_a_min && min >= thresholds.min_dim_a_min {
        RiskLevel::A
    } else if avg >= thresholds.avg_b_min {
        RiskLevel::B
    } else if avg >= thresholds.avg_c_min {
        RiskLevel::C
    } else {
        RiskLevel::D
    }
}
