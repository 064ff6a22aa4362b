//! Case-level risk diagnostics.
//!
//! Aggregates every resolved document into bucket counts, the four
//! dimension scores, the G1a-G6 gate flags with their supporting
//! details, and a ranked top-risk list. All coefficients come from the
//! injected rule profile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::case::DefinedPeriod;
use crate::models::document::EvidenceDocument;
use crate::models::enums::{Confidence, CoverageLane, TargetCode};
use crate::rules::{ScoreRules, TimeRules};

use super::fields::{assess_fields, FieldReport};
use super::targets::eligible_targets;

/// Gate codes, ordered as reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GateCode {
    G1a,
    G1b,
    G1c,
    G1d,
    G2,
    G3,
    G4,
    G5,
    G6,
}

impl GateCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::G1a => "G1a",
            Self::G1b => "G1b",
            Self::G1c => "G1c",
            Self::G1d => "G1d",
            Self::G2 => "G2",
            Self::G3 => "G3",
            Self::G4 => "G4",
            Self::G5 => "G5",
            Self::G6 => "G6",
        }
    }
}

/// Gate flags with their supporting detail strings. A gate is set iff it
/// carries at least one detail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateFlags {
    details: BTreeMap<GateCode, Vec<String>>,
}

impl GateFlags {
    pub fn set(&mut self, code: GateCode, detail: impl Into<String>) {
        self.details.entry(code).or_default().push(detail.into());
    }

    pub fn is_set(&self, code: GateCode) -> bool {
        self.details.get(&code).is_some_and(|d| !d.is_empty())
    }

    pub fn details(&self, code: GateCode) -> &[String] {
        self.details.get(&code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn triggered(&self) -> Vec<GateCode> {
        self.details
            .iter()
            .filter(|(_, d)| !d.is_empty())
            .map(|(c, _)| *c)
            .collect()
    }
}

/// The four dimension scores, each clamped to [0, 100].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DimensionScores {
    pub time: f64,
    pub mapping: f64,
    #[serde(rename = "loop")]
    pub loop_: f64,
    pub verifiability: f64,
}

impl DimensionScores {
    pub fn average(&self) -> f64 {
        (self.time + self.mapping + self.loop_ + self.verifiability) / 4.0
    }

    pub fn minimum(&self) -> f64 {
        self.time.min(self.mapping).min(self.loop_).min(self.verifiability)
    }

    /// The weakest dimension and its score.
    pub fn bottleneck(&self) -> (&'static str, f64) {
        let pairs = [
            ("time", self.time),
            ("mapping", self.mapping),
            ("loop", self.loop_),
            ("verifiability", self.verifiability),
        ];
        pairs
            .into_iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .expect("four dimensions")
    }
}

/// Aggregate bucket counts over the canonical document set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticsSummary {
    pub total: usize,
    /// Documents in the substantive lane with a valid date field.
    pub time_scope_total: usize,
    pub in_period_highmed: usize,
    pub in_period_low: usize,
    pub out_period: usize,
    pub unknown_time: usize,
    pub contradictions: usize,
    /// Reference-lane documents whose anchor overlaps the period.
    pub in_period_reference: usize,
    pub goods_matched: usize,
    pub mark_yes: usize,
    pub subject_yes: usize,
    pub loop_yes: usize,
    pub verifiable_yes: usize,
    pub covered_targets: usize,
    pub weak_loop_proxy: usize,
    pub merged_duplicates: usize,
}

/// One row of the per-document diagnostics table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRow {
    pub name: String,
    pub anchor: String,
    /// "yes" / "no" / "unknown"
    pub in_period: String,
    pub confidence: Confidence,
    pub lane: CoverageLane,
    pub anchor_type: String,
    pub anchor_channel: String,
    pub selection_rule: String,
    pub claimed_targets: Vec<TargetCode>,
    pub scored_targets: Vec<TargetCode>,
    pub conflict: bool,
    pub merged_duplicates: u32,
}

/// Full diagnostics output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseDiagnostics {
    pub gates: GateFlags,
    pub dim_scores: DimensionScores,
    pub summary: DiagnosticsSummary,
    pub evidence_rows: Vec<EvidenceRow>,
    pub top_risks: Vec<String>,
    /// Field reports per canonical document, in row order.
    pub field_reports: Vec<FieldReport>,
}

/// Build the case diagnostics over the canonical (non-duplicate)
/// documents.
pub fn build_diagnostics(
    documents: &[EvidenceDocument],
    period: Option<&DefinedPeriod>,
    time_rules: &TimeRules,
    score_rules: &ScoreRules,
) -> CaseDiagnostics {
    let margin = time_rules.anchor_weights.contradiction_margin_days;
    let mut summary = DiagnosticsSummary::default();
    let mut gates = GateFlags::default();
    let mut rows = Vec::new();
    let mut reports = Vec::new();
    let mut t_coverage: BTreeMap<TargetCode, usize> = BTreeMap::new();

    for doc in documents.iter().filter(|d| !d.is_duplicate()) {
        summary.total += 1;
        summary.merged_duplicates += doc.merged_duplicates as usize;

        let report = assess_fields(doc);
        let scored = eligible_targets(doc, &report);
        let allowed = !doc.kind.is_procedural();
        let anchor = doc.anchor.as_ref();
        let range = anchor.and_then(|a| a.range);
        let confidence = anchor.map(|a| a.confidence).unwrap_or(Confidence::Low);
        let in_period = match (period, range) {
            (Some(p), Some(r)) => Some(p.overlaps(r.start, r.end)),
            _ => None,
        };

        if allowed && report.date.is_valid() {
            summary.time_scope_total += 1;
        } else if in_period == Some(true) && !allowed {
            summary.in_period_reference += 1;
        }

        // cross-period contradiction: formation date far from the anchor
        // range on both sides
        if let (Some(formation), Some(r)) = (doc.formation_date, range) {
            let outside = formation < r.start || formation > r.end;
            let far_start = (formation - r.start).num_days().abs() > margin;
            let far_end = (formation - r.end).num_days().abs() > margin;
            if outside && far_start && far_end {
                summary.contradictions += 1;
                gates.set(GateCode::G1d, doc.name.clone());
            }
        }

        if allowed {
            match (range, in_period) {
                (Some(_), Some(true)) => {
                    if confidence.is_scorable() {
                        summary.in_period_highmed += 1;
                    } else {
                        summary.in_period_low += 1;
                    }
                }
                (Some(_), Some(false)) => summary.out_period += 1,
                _ => summary.unknown_time += 1,
            }
        }

        if allowed {
            if report.goods.is_valid() {
                summary.goods_matched += 1;
            }
            if report.mark_presence.is_valid() {
                summary.mark_yes += 1;
            }
            if doc.subject_matched {
                summary.subject_yes += 1;
            }
            if doc.explicit_loop
                && (!doc.kind.is_trade_like()
                    || (report.amount.is_valid() && report.party.is_valid()))
            {
                summary.loop_yes += 1;
            }
            if doc.verifiable {
                summary.verifiable_yes += 1;
            }
            for t in &scored {
                *t_coverage.entry(*t).or_default() += 1;
            }
        }

        rows.push(EvidenceRow {
            name: doc.name.clone(),
            anchor: range
                .map(|r| {
                    if r.start == r.end {
                        r.start.to_string()
                    } else {
                        format!("{} ~ {}", r.start, r.end)
                    }
                })
                .unwrap_or_else(|| "unknown".into()),
            in_period: match in_period {
                Some(true) => "yes".into(),
                Some(false) => "no".into(),
                None => "unknown".into(),
            },
            confidence,
            lane: doc.coverage_lane(),
            anchor_type: anchor
                .map(|a| a.anchor_type.as_str().to_string())
                .unwrap_or_else(|| "uncertain".into()),
            anchor_channel: anchor
                .map(|a| a.source_channel.as_str().to_string())
                .unwrap_or_else(|| "base".into()),
            selection_rule: anchor.map(|a| a.selection_rule.clone()).unwrap_or_default(),
            claimed_targets: doc.claimed_targets.clone(),
            scored_targets: scored,
            conflict: anchor.map(|a| a.conflict).unwrap_or(false),
            merged_duplicates: doc.merged_duplicates,
        });
        reports.push(report);
    }

    summary.covered_targets = t_coverage.values().filter(|c| **c > 0).count();
    summary.weak_loop_proxy = summary
        .mark_yes
        .min(summary.subject_yes)
        .min(t_coverage.get(&TargetCode::T5).copied().unwrap_or(0))
        .min(summary.in_period_highmed);

    apply_case_gates(&mut gates, &summary, period, score_rules);
    let dim_scores = dimension_scores(&summary, period, time_rules, score_rules, &gates);
    let top_risks = rank_top_risks(&gates, &summary, dim_scores);

    CaseDiagnostics {
        gates,
        dim_scores,
        summary,
        evidence_rows: rows,
        top_risks,
        field_reports: reports,
    }
}

fn apply_case_gates(
    gates: &mut GateFlags,
    summary: &DiagnosticsSummary,
    period: Option<&DefinedPeriod>,
    score_rules: &ScoreRules,
) {
    if period.is_none() {
        gates.set(
            GateCode::G1a,
            "defined period start/end missing or unparseable",
        );
    } else {
        if summary.in_period_highmed == 0 && summary.in_period_low == 0 {
            gates.set(
                GateCode::G1b,
                "no substantive evidence covers the defined period (range overlap included)",
            );
            if summary.in_period_reference > 0 {
                gates.set(
                    GateCode::G1b,
                    "only reference-lane (procedural) material covers the period; it does not constitute substantive coverage",
                );
            }
        } else if summary.in_period_highmed == 0 {
            gates.set(
                GateCode::G1c,
                "in-period coverage exists but is entirely low-confidence",
            );
        }
    }

    if summary.goods_matched == 0 {
        gates.set(
            GateCode::G2,
            "no substantive evidence hits the designated goods/services",
        );
    }
    if summary.mark_yes == 0 {
        gates.set(
            GateCode::G3,
            "no substantive evidence confirms the mark was shown",
        );
    }
    if summary.subject_yes == 0 {
        gates.set(
            GateCode::G4,
            "no substantive evidence confirms a consistent using party",
        );
    }
    let proxy_min = score_rules.loop_score_weights.weak_loop_proxy_min as usize;
    if summary.loop_yes == 0 && summary.weak_loop_proxy < proxy_min {
        gates.set(
            GateCode::G5,
            "no explicit commercial loop and the display+subject+time+scene chain falls short of the minimum anchoring",
        );
    }
    if summary.verifiable_yes == 0 {
        gates.set(
            GateCode::G6,
            "no verifiable source or original carrier across the case",
        );
    }
}

fn dimension_scores(
    summary: &DiagnosticsSummary,
    period: Option<&DefinedPeriod>,
    time_rules: &TimeRules,
    score_rules: &ScoreRules,
    gates: &GateFlags,
) -> DimensionScores {
    let time_w = &time_rules.time_score_weights;
    let map_w = &score_rules.mapping_score_weights;
    let loop_w = &score_rules.loop_score_weights;
    let ver_w = &score_rules.verifiability_score_weights;

    let time_ev = summary.time_scope_total.max(1) as f64;
    let allowed_ev = summary.time_scope_total.max(1) as f64;

    let time = if period.is_some() {
        time_w.base
            + time_w.in_period_highmed * (summary.in_period_highmed as f64 / time_ev)
            + time_w.in_period_low * (summary.in_period_low as f64 / time_ev)
            - time_w.unknown_penalty * (summary.unknown_time as f64 / time_ev)
            - time_w.contradiction_penalty * (summary.contradictions as f64 / time_ev)
            - time_w.out_period_penalty * (summary.out_period as f64 / time_ev)
    } else {
        0.0
    };

    let mapping = map_w.base
        + map_w.per_target * summary.covered_targets as f64
        + map_w.goods_ratio_bonus * (summary.goods_matched as f64 / allowed_ev);

    let mut loop_ = loop_w.base
        + loop_w.loop_ratio_bonus * (summary.loop_yes as f64 / allowed_ev)
        + loop_w.mark_ratio_bonus * (summary.mark_yes as f64 / allowed_ev)
        + loop_w.subject_ratio_bonus * (summary.subject_yes as f64 / allowed_ev);
    if gates.is_set(GateCode::G5) {
        loop_ -= loop_w.weak_loop_penalty;
    }

    let verifiability = ver_w.base
        + ver_w.verifiable_ratio_bonus * (summary.verifiable_yes as f64 / allowed_ev)
        - ver_w.contradiction_penalty * (summary.contradictions as f64 / time_ev);

    DimensionScores {
        time: clamp(time),
        mapping: clamp(mapping),
        loop_: clamp(loop_),
        verifiability: clamp(verifiability),
    }
}

fn clamp(x: f64) -> f64 {
    x.clamp(0.0, 100.0)
}

fn rank_top_risks(
    gates: &GateFlags,
    summary: &DiagnosticsSummary,
    dims: DimensionScores,
) -> Vec<String> {
    let mut risks = Vec::new();
    if gates.is_set(GateCode::G1b) {
        risks.push(
            "G1b: no evidence covers the defined period — supplement in-period evidence or rebuild the time anchors".to_string(),
        );
    }
    if gates.is_set(GateCode::G1c) {
        risks.push(
            "G1c: in-period coverage rests on low-confidence material only — prioritize verifiable third-party or loop evidence".to_string(),
        );
    }
    if summary.contradictions > 0 {
        risks.push(format!(
            "G1d: {} suspected cross-period contradiction(s) between formation date and anchor — verify the original carriers",
            summary.contradictions
        ));
    }
    if gates.is_set(GateCode::G5) {
        risks.push(
            "G5: commercial loop is weak — add one of order/payment/delivery/acceptance bound to the mark and goods".to_string(),
        );
    }
    if gates.is_set(GateCode::G6) {
        risks.push(
            "G6: verifiability is insufficient — add tax records, platform exports, delivery receipts or payment flows".to_string(),
        );
    }
    if summary.in_period_highmed == 0 && summary.in_period_reference > 0 {
        risks.push(
            "Reference-lane material covers the period but carries no substantive probative force".to_string(),
        );
    }
    if risks.is_empty() {
        let (name, score) = dims.bottleneck();
        risks.push(format!("Main bottleneck dimension: {name} ({score:.1})"));
    }
    risks
}
