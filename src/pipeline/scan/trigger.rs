//! Pure round-trigger decisions and re-scan subset selection.
//!
//! All OCR and I/O stays outside these functions so the five-round logic
//! is unit-testable without any collaborator: the controller feeds in
//! the current case fields and signal scores, and gets back a decision
//! plus a rationale string for the audit trail.

use crate::models::case::CaseFields;
use crate::models::document::EvidenceDocument;
use crate::models::enums::ScanMode;
use crate::rules::profile::{RoundTriggerRules, ScanBudgetRules};
use crate::rules::Lexicons;

/// Outcome of evaluating one round's trigger condition.
#[derive(Debug, Clone)]
pub struct TriggerDecision {
    pub trigger: bool,
    pub rationale: String,
    pub weak_fraction: f64,
}

/// Evaluate whether round `ordinal` (1-5) should run.
///
/// Rounds 1 and 2 are mandatory. Rounds 3-5 fire iff a required case
/// field is still missing or the weak-signal fraction exceeds the round's
/// mode-dependent ratio.
pub fn evaluate_round(
    ordinal: u8,
    mode: ScanMode,
    case_fields: &CaseFields,
    signal_scores: &[f64],
    rules: &RoundTriggerRules,
) -> TriggerDecision {
    match ordinal {
        1 => TriggerDecision {
            trigger: true,
            rationale: "mandatory round: notice-first scan for an initial case-field guess".into(),
            weak_fraction: 0.0,
        },
        2 => TriggerDecision {
            trigger: true,
            rationale: "mandatory round: full baseline scan of all documents".into(),
            weak_fraction: 0.0,
        },
        3..=5 => conditional_round(ordinal, mode, case_fields, signal_scores, rules),
        _ => TriggerDecision {
            trigger: false,
            rationale: format!("round {ordinal} is outside the five-round plan"),
            weak_fraction: 0.0,
        },
    }
}

fn conditional_round(
    ordinal: u8,
    mode: ScanMode,
    case_fields: &CaseFields,
    signal_scores: &[f64],
    rules: &RoundTriggerRules,
) -> TriggerDecision {
    let missing = case_fields.missing_required();
    let weak_fraction = weak_fraction(signal_scores, rules.signal_floor);
    let ratio = ratio_for(ordinal, mode, rules);

    if !missing.is_empty() {
        return TriggerDecision {
            trigger: true,
            rationale: format!(
                "required case fields still missing: {}",
                missing.join(", ")
            ),
            weak_fraction,
        };
    }
    if weak_fraction > ratio {
        return TriggerDecision {
            trigger: true,
            rationale: format!(
                "weak-signal fraction {weak_fraction:.2} exceeds the round-{ordinal} ratio {ratio:.2}"
            ),
            weak_fraction,
        };
    }
    TriggerDecision {
        trigger: false,
        rationale: format!(
            "case fields complete and weak-signal fraction {weak_fraction:.2} within the round-{ordinal} ratio {ratio:.2}"
        ),
        weak_fraction,
    }
}

fn weak_fraction(signal_scores: &[f64], floor: f64) -> f64 {
    if signal_scores.is_empty() {
        return 0.0;
    }
    let weak = signal_scores.iter().filter(|s| **s < floor).count();
    weak as f64 / signal_scores.len() as f64
}

/// The mode-dependent ratio ladder. Mix runs resolve to the conservative
/// full ladder.
fn ratio_for(ordinal: u8, mode: ScanMode, rules: &RoundTriggerRules) -> f64 {
    let idx = usize::from(ordinal.saturating_sub(3)).min(2);
    match mode {
        ScanMode::Fast => rules.fast_ratios[idx],
        ScanMode::Full | ScanMode::Mix => rules.full_ratios[idx],
    }
}

/// Re-scan priority categories, strongest claim first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RescanCategory {
    Structured,
    Promotional,
    Unnamed,
    WeakImage,
}

fn categorize(name_lower: &str, lexicons: &Lexicons) -> RescanCategory {
    if Lexicons::hit(name_lower, &lexicons.structured_names) {
        RescanCategory::Structured
    } else if Lexicons::hit(name_lower, &lexicons.promotional_names) {
        RescanCategory::Promotional
    } else if Lexicons::hit(name_lower, &lexicons.weak_names) {
        RescanCategory::WeakImage
    } else {
        RescanCategory::Unnamed
    }
}

/// Select the capped, priority-ordered subset a conditional round
/// re-scans.
///
/// Candidates are the weak-signal documents plus every structured-named
/// document. Structured documents come first, then promotional, then
/// unnamed, then weak generic-image names. The weak-image category is
/// capped separately so it can never crowd out stronger candidates, and
/// the whole selection is bounded by the round cap.
pub fn select_rescan(
    documents: &[EvidenceDocument],
    signal_scores: &[f64],
    budgets: &ScanBudgetRules,
    trigger_rules: &RoundTriggerRules,
    lexicons: &Lexicons,
) -> Vec<usize> {
    let mut candidates: Vec<(RescanCategory, f64, usize)> = documents
        .iter()
        .enumerate()
        .filter_map(|(idx, doc)| {
            let name_lower = doc.name.to_lowercase();
            let category = categorize(&name_lower, lexicons);
            let score = signal_scores.get(idx).copied().unwrap_or(0.0);
            let weak = score < trigger_rules.signal_floor;
            (weak || category == RescanCategory::Structured)
                .then_some((category, score, idx))
        })
        .collect();

    // category first, weakest signal first within a category
    candidates.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut selected = Vec::new();
    let mut weak_image_taken = 0usize;
    for (category, _, idx) in candidates {
        if selected.len() >= budgets.rescan_cap {
            break;
        }
        if category == RescanCategory::WeakImage {
            if weak_image_taken >= budgets.weak_cap {
                continue;
            }
            weak_image_taken += 1;
        }
        selected.push(idx);
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::case::DefinedPeriod;
    use crate::models::enums::SourceBucket;
    use chrono::NaiveDate;

    fn complete_fields() -> CaseFields {
        CaseFields {
            registration_no: Some("1234567".into()),
            class_no: Some("25".into()),
            applicant: Some("Acme Holdings Ltd".into()),
            respondent: Some("Registrant Co".into()),
            mark_name: Some("NORTHWIND".into()),
            goods_services: Some("bottles".into()),
            period: Some(DefinedPeriod::new(
                NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            )),
        }
    }

    #[test]
    fn rounds_one_and_two_always_trigger() {
        let rules = RoundTriggerRules::default();
        for ordinal in [1, 2] {
            let d = evaluate_round(ordinal, ScanMode::Full, &CaseFields::default(), &[], &rules);
            assert!(d.trigger, "round {ordinal} must be mandatory");
        }
    }

    #[test]
    fn missing_fields_trigger_conditional_rounds() {
        let rules = RoundTriggerRules::default();
        let d = evaluate_round(3, ScanMode::Full, &CaseFields::default(), &[0.9, 0.9], &rules);
        assert!(d.trigger);
        assert!(d.rationale.contains("missing"));
    }

    #[test]
    fn weak_fraction_above_ratio_triggers() {
        let rules = RoundTriggerRules::default();
        // 3 of 4 documents weak → 0.75 > 0.55
        let signals = [0.1, 0.2, 0.3, 0.9];
        let d = evaluate_round(3, ScanMode::Full, &complete_fields(), &signals, &rules);
        assert!(d.trigger);
        assert!((d.weak_fraction - 0.75).abs() < 1e-9);
    }

    #[test]
    fn strong_signals_do_not_trigger() {
        let rules = RoundTriggerRules::default();
        let signals = [0.8, 0.9, 0.7, 0.95];
        let d = evaluate_round(3, ScanMode::Full, &complete_fields(), &signals, &rules);
        assert!(!d.trigger);
    }

    #[test]
    fn ratios_shrink_per_round() {
        let rules = RoundTriggerRules::default();
        // 0.35 weak fraction: below round-3 full ratio (0.55), above round-5 (0.30)
        let signals: Vec<f64> = [vec![0.1; 35], vec![0.9; 65]].concat();
        let r3 = evaluate_round(3, ScanMode::Full, &complete_fields(), &signals, &rules);
        let r5 = evaluate_round(5, ScanMode::Full, &complete_fields(), &signals, &rules);
        assert!(!r3.trigger);
        assert!(r5.trigger);
    }

    #[test]
    fn fast_mode_uses_aggressive_ratios() {
        let rules = RoundTriggerRules::default();
        // 0.5 weak fraction: below full round-3 ratio, above fast round-3 ratio
        let signals: Vec<f64> = [vec![0.1; 50], vec![0.9; 50]].concat();
        let full = evaluate_round(3, ScanMode::Full, &complete_fields(), &signals, &rules);
        let fast = evaluate_round(3, ScanMode::Fast, &complete_fields(), &signals, &rules);
        assert!(!full.trigger);
        assert!(fast.trigger);
    }

    #[test]
    fn empty_document_set_never_triggers_on_signals() {
        let rules = RoundTriggerRules::default();
        let d = evaluate_round(4, ScanMode::Full, &complete_fields(), &[], &rules);
        assert!(!d.trigger);
        assert_eq!(d.weak_fraction, 0.0);
    }

    // ── re-scan selection ──────────────────────────────────────────────

    fn named_doc(name: &str) -> EvidenceDocument {
        EvidenceDocument::new(name, format!("/in/{name}"), SourceBucket::General)
    }

    #[test]
    fn structured_names_selected_before_images() {
        let lex = Lexicons::default();
        let budgets = ScanBudgetRules {
            rescan_cap: 3,
            weak_cap: 2,
            ..Default::default()
        };
        let trigger_rules = RoundTriggerRules::default();
        let docs = vec![
            named_doc("IMG_0001.jpg"),
            named_doc("IMG_0002.jpg"),
            named_doc("sales_contract.pdf"),
            named_doc("invoice_march.pdf"),
        ];
        let signals = vec![0.1, 0.1, 0.1, 0.1];
        let selected = select_rescan(&docs, &signals, &budgets, &trigger_rules, &lex);
        assert_eq!(selected.len(), 3);
        // both structured documents make the cut before any image
        assert!(selected.contains(&2));
        assert!(selected.contains(&3));
    }

    #[test]
    fn weak_image_cap_is_separate() {
        let lex = Lexicons::default();
        let budgets = ScanBudgetRules {
            rescan_cap: 10,
            weak_cap: 2,
            ..Default::default()
        };
        let trigger_rules = RoundTriggerRules::default();
        let docs: Vec<EvidenceDocument> =
            (0..6).map(|i| named_doc(&format!("IMG_{i:04}.jpg"))).collect();
        let signals = vec![0.1; 6];
        let selected = select_rescan(&docs, &signals, &budgets, &trigger_rules, &lex);
        // numerically larger weak category cannot exceed its own cap
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn strong_structured_documents_still_candidates() {
        let lex = Lexicons::default();
        let budgets = ScanBudgetRules::default();
        let trigger_rules = RoundTriggerRules::default();
        let docs = vec![named_doc("contract.pdf"), named_doc("holiday_photo.jpg")];
        // both strong: only the structured doc remains a candidate
        let signals = vec![0.9, 0.9];
        let selected = select_rescan(&docs, &signals, &budgets, &trigger_rules, &lex);
        assert_eq!(selected, vec![0]);
    }

    #[test]
    fn selection_never_exceeds_round_cap() {
        let lex = Lexicons::default();
        let budgets = ScanBudgetRules {
            rescan_cap: 4,
            weak_cap: 2,
            ..Default::default()
        };
        let trigger_rules = RoundTriggerRules::default();
        let mut docs = Vec::new();
        for i in 0..10 {
            docs.push(named_doc(&format!("contract_{i}.pdf")));
        }
        let signals = vec![0.1; 10];
        let selected = select_rescan(&docs, &signals, &budgets, &trigger_rules, &lex);
        assert_eq!(selected.len(), 4);
    }
}
