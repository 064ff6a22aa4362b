//! Diagnostics report assembly.
//!
//! Bundles everything downstream report/document generators consume: the
//! case fields, dimension scores and gates, per-document rows, the
//! reason chain per proof element, the low-confidence field inventory,
//! the period segmentation, dedup results, the per-round audit trail and
//! the rule-profile provenance.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::case::{CaseFields, DefinedPeriod};
use crate::models::enums::{Confidence, FieldKind, RiskLevel, TargetCode, Validity};
use crate::pipeline::dedup::DedupReport;
use crate::pipeline::scan::ScanRound;
use crate::rules::{RuleProfile, RuleSource};
use crate::scoring::diagnostics::CaseDiagnostics;
use crate::scoring::risk::derive_risk_level;

/// One year-long phase of the defined period, for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSegment {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Split the defined period into up to three year-long phases.
pub fn period_segments(period: &DefinedPeriod) -> Vec<PeriodSegment> {
    let mut segments = Vec::new();
    let mut cursor = period.start;
    for ordinal in 1..=3 {
        if cursor > period.end {
            break;
        }
        let next = add_year(cursor);
        let end = if ordinal == 3 {
            period.end
        } else {
            (next - chrono::Duration::days(1)).min(period.end)
        };
        segments.push(PeriodSegment {
            label: format!("phase {ordinal}"),
            start: cursor,
            end,
        });
        cursor = end + chrono::Duration::days(1);
    }
    segments
}

fn add_year(d: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year() + 1, d.month(), d.day())
        // 2/29 → 2/28 on non-leap years
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(d.year() + 1, 2, 28).expect("valid date"))
}

/// One proof element of the reason chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonElement {
    pub code: TargetCode,
    pub label: String,
    pub score: u32,
    pub evidence: Vec<String>,
}

/// The per-element reason chain with its pass/warn decision and the rule
/// provenance that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonChain {
    pub elements: Vec<ReasonElement>,
    pub covered_elements: usize,
    pub pass_min_elements: u32,
    /// "PASS" when enough elements are covered, else "WARN".
    pub decision: String,
    pub decision_rule: String,
}

fn build_reason_chain(diag: &CaseDiagnostics, profile: &RuleProfile) -> ReasonChain {
    let scoring = &profile.scoring.element_scoring;
    let mut buckets: BTreeMap<TargetCode, Vec<String>> = BTreeMap::new();
    for row in &diag.evidence_rows {
        for code in &row.scored_targets {
            let bucket = buckets.entry(*code).or_default();
            if !bucket.contains(&row.name) {
                bucket.push(row.name.clone());
            }
        }
    }

    let elements: Vec<ReasonElement> = TargetCode::all()
        .into_iter()
        .map(|code| {
            let evidence = buckets.remove(&code).unwrap_or_default();
            let score = if evidence.is_empty() {
                0
            } else {
                (evidence.len() as u32 * scoring.per_evidence_score
                    + scoring.weight_for(code.as_str()))
                .min(scoring.max_element_score)
            };
            ReasonElement {
                code,
                label: code.label().to_string(),
                score,
                evidence,
            }
        })
        .collect();

    let covered = elements.iter().filter(|e| !e.evidence.is_empty()).count();
    let pass_min = profile.risk.pass_min_elements.0;
    ReasonChain {
        covered_elements: covered,
        pass_min_elements: pass_min,
        decision: if covered >= pass_min as usize {
            "PASS".into()
        } else {
            "WARN".into()
        },
        decision_rule: "covered_elements >= pass_min_elements => PASS else WARN".into(),
        elements,
    }
}

/// One low-confidence or invalid field occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowConfidenceIssue {
    pub document: String,
    pub field: FieldKind,
    pub value: String,
    pub confidence: Confidence,
    pub validity: Validity,
    pub reason_code: String,
}

/// Inventory of every field that must not silently enter core scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LowConfidenceReport {
    pub issues: Vec<LowConfidenceIssue>,
    pub by_field: BTreeMap<String, usize>,
    pub by_reason: BTreeMap<String, usize>,
}

fn build_low_confidence(diag: &CaseDiagnostics) -> LowConfidenceReport {
    let mut report = LowConfidenceReport::default();
    for (row, fields) in diag.evidence_rows.iter().zip(&diag.field_reports) {
        let pairs = [
            (FieldKind::Date, &fields.date),
            (FieldKind::Amount, &fields.amount),
            (FieldKind::Party, &fields.party),
            (FieldKind::Goods, &fields.goods),
            (FieldKind::MarkPresence, &fields.mark_presence),
        ];
        for (kind, assessment) in pairs {
            if assessment.validity == Validity::Invalid || assessment.confidence == Confidence::Low
            {
                *report.by_field.entry(kind.as_str().into()).or_default() += 1;
                *report
                    .by_reason
                    .entry(assessment.reason_code.clone())
                    .or_default() += 1;
                report.issues.push(LowConfidenceIssue {
                    document: row.name.clone(),
                    field: kind,
                    value: assessment.value.clone(),
                    confidence: assessment.confidence,
                    validity: assessment.validity,
                    reason_code: assessment.reason_code.clone(),
                });
            }
        }
    }
    report
}

/// Everything a downstream generator needs from one case run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub case_fields: CaseFields,
    pub period_segments: Vec<PeriodSegment>,
    pub diagnostics: CaseDiagnostics,
    pub risk_level: RiskLevel,
    pub decision: String,
    pub reason_chain: ReasonChain,
    pub low_confidence: LowConfidenceReport,
    pub dedup: DedupReport,
    pub rounds: Vec<ScanRound>,
    pub rule_sources: Vec<RuleSource>,
}

/// Assemble the final report from the pipeline's parts.
pub fn build_report(
    case_fields: CaseFields,
    diagnostics: CaseDiagnostics,
    dedup: DedupReport,
    rounds: Vec<ScanRound>,
    profile: &RuleProfile,
) -> DiagnosticsReport {
    let risk_level = derive_risk_level(&diagnostics, &profile.time, &profile.risk);
    let decision = profile.risk.decision_for(risk_level);
    let reason_chain = build_reason_chain(&diagnostics, profile);
    let low_confidence = build_low_confidence(&diagnostics);
    let period_segments = case_fields
        .period
        .as_ref()
        .map(period_segments)
        .unwrap_or_default();

    tracing::info!(
        risk_level = risk_level.as_str(),
        decision = %decision,
        gates = ?diagnostics.gates.triggered(),
        "Case diagnosis complete"
    );

    DiagnosticsReport {
        case_fields,
        period_segments,
        diagnostics,
        risk_level,
        decision,
        reason_chain,
        low_confidence,
        dedup,
        rounds,
        rule_sources: profile.sources.clone(),
    }
}
