//! Per-document field validity.
//!
//! Every key field gets a confidence/validity/reason-code triple so low
//! confidence values never leak into the core scoring unnoticed. The
//! date field is lane-aware (procedural documents are never scored on
//! time); amount and party are scored only for trade-like documents.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::document::EvidenceDocument;
use crate::models::enums::{Confidence, GoodsMatch, Validity};

static RE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));

/// Generic placeholders that never identify a counterparty.
const GENERIC_PARTIES: &[&str] = &[
    "buyer",
    "seller",
    "customer",
    "client",
    "counterparty",
    "individual",
    "party a",
    "party b",
];

/// Trailing words marking a named legal entity.
const ENTITY_SUFFIXES: &[&str] = &[
    "ltd", "llc", "inc", "co", "corp", "corporation", "company", "gmbh", "plc", "group", "store",
    "shop", "bank", "hospital", "platform", "factory",
];

/// One field's quality assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAssessment {
    pub value: String,
    pub confidence: Confidence,
    pub validity: Validity,
    pub reason_code: String,
}

impl FieldAssessment {
    fn new(
        value: impl Into<String>,
        confidence: Confidence,
        validity: Validity,
        reason_code: &str,
    ) -> Self {
        Self {
            value: value.into(),
            confidence,
            validity,
            reason_code: reason_code.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }
}

/// All five field assessments for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReport {
    pub date: FieldAssessment,
    pub amount: FieldAssessment,
    pub party: FieldAssessment,
    pub goods: FieldAssessment,
    pub mark_presence: FieldAssessment,
}

/// Assess every key field of a document against its resolved anchor and
/// classification flags.
pub fn assess_fields(doc: &EvidenceDocument) -> FieldReport {
    FieldReport {
        date: assess_date(doc),
        amount: assess_amount(doc),
        party: assess_party(doc),
        goods: assess_goods(doc),
        mark_presence: assess_mark(doc),
    }
}

fn assess_date(doc: &EvidenceDocument) -> FieldAssessment {
    if doc.kind.is_procedural() {
        return FieldAssessment::new(
            anchor_label(doc),
            Confidence::NotApplicable,
            Validity::NotApplicable,
            "date_not_scored_lane",
        );
    }
    match &doc.anchor {
        Some(anchor) if anchor.is_resolved() && anchor.confidence.is_scorable() => {
            FieldAssessment::new(
                anchor_label(doc),
                anchor.confidence,
                Validity::Valid,
                "date_anchor_valid",
            )
        }
        Some(anchor) if anchor.is_resolved() => FieldAssessment::new(
            anchor_label(doc),
            Confidence::Low,
            Validity::Invalid,
            "date_low_confidence",
        ),
        _ => FieldAssessment::new(
            "",
            Confidence::Low,
            Validity::Invalid,
            "date_anchor_missing",
        ),
    }
}

fn anchor_label(doc: &EvidenceDocument) -> String {
    doc.anchor
        .as_ref()
        .and_then(|a| a.range)
        .map(|r| {
            if r.start == r.end {
                r.start.to_string()
            } else {
                format!("{}~{}", r.start, r.end)
            }
        })
        .unwrap_or_default()
}

fn assess_amount(doc: &EvidenceDocument) -> FieldAssessment {
    if !doc.kind.is_trade_like() {
        return FieldAssessment::new(
            doc.trade_amount.clone().unwrap_or_default(),
            Confidence::NotApplicable,
            Validity::NotApplicable,
            "amount_not_trade",
        );
    }
    let raw = doc.trade_amount.as_deref().map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return FieldAssessment::new("", Confidence::Low, Validity::Invalid, "amount_missing");
    }
    match parse_amount(raw) {
        Some(v) if v > 0.0 => {
            FieldAssessment::new(raw, Confidence::High, Validity::Valid, "amount_parsed")
        }
        _ => FieldAssessment::new(raw, Confidence::Low, Validity::Invalid, "amount_parse_failed"),
    }
}

/// Largest numeric token in the raw amount string.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    RE_NUMBER
        .find_iter(&cleaned)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
}

fn assess_party(doc: &EvidenceDocument) -> FieldAssessment {
    if !doc.kind.is_trade_like() {
        return FieldAssessment::new(
            doc.counterparty.clone().unwrap_or_default(),
            Confidence::NotApplicable,
            Validity::NotApplicable,
            "party_not_trade",
        );
    }
    let raw = doc.counterparty.as_deref().map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return FieldAssessment::new("", Confidence::Low, Validity::Invalid, "party_missing");
    }
    let lower = raw.to_lowercase();
    let compact: String = lower.chars().filter(|c| c.is_alphanumeric()).collect();
    if compact.chars().count() < 2 {
        return FieldAssessment::new(raw, Confidence::Low, Validity::Invalid, "party_too_short");
    }
    if GENERIC_PARTIES.contains(&lower.trim()) {
        return FieldAssessment::new(raw, Confidence::Low, Validity::Invalid, "party_generic");
    }
    let last_word = lower
        .split_whitespace()
        .last()
        .unwrap_or("")
        .trim_end_matches('.');
    if ENTITY_SUFFIXES.contains(&last_word) {
        return FieldAssessment::new(raw, Confidence::High, Validity::Valid, "party_entity_named");
    }
    FieldAssessment::new(raw, Confidence::Medium, Validity::Valid, "party_named")
}

fn assess_goods(doc: &EvidenceDocument) -> FieldAssessment {
    let value = doc.goods_match.as_str().to_uppercase();
    match doc.goods_match {
        GoodsMatch::Direct => {
            FieldAssessment::new(value, Confidence::High, Validity::Valid, "goods_direct_match")
        }
        GoodsMatch::Synonym => FieldAssessment::new(
            value,
            Confidence::Medium,
            Validity::Valid,
            "goods_synonym_match",
        ),
        GoodsMatch::Unmatched => {
            FieldAssessment::new(value, Confidence::Low, Validity::Invalid, "goods_unmatched")
        }
        GoodsMatch::Missing => {
            FieldAssessment::new("", Confidence::Low, Validity::Invalid, "goods_missing")
        }
    }
}

fn assess_mark(doc: &EvidenceDocument) -> FieldAssessment {
    if doc.mark_shown && doc.mark_name_confidence.is_scorable() {
        FieldAssessment::new(
            "Y",
            doc.mark_name_confidence,
            Validity::Valid,
            "mark_present",
        )
    } else if doc.mark_shown {
        FieldAssessment::new("Y", Confidence::Low, Validity::Invalid, "mark_low_confidence")
    } else {
        FieldAssessment::new("N", Confidence::Low, Validity::Invalid, "mark_not_shown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::anchor::{DateRange, TimeAnchor};
    use crate::models::enums::{AnchorType, Channel, DocumentKind, SourceBucket};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn doc_with_anchor(kind: DocumentKind, confidence: Confidence) -> EvidenceDocument {
        let mut doc = EvidenceDocument::new("e.pdf", "/in/e.pdf", SourceBucket::General);
        doc.kind = kind;
        doc.anchor = Some(TimeAnchor {
            range: Some(DateRange::new(d(2023, 4, 15), d(2023, 4, 15))),
            confidence,
            anchor_type: AnchorType::TransactionDate,
            source_channel: Channel::Order,
            conflict: false,
            candidates: Vec::new(),
            selection_rule: "test".into(),
        });
        doc
    }

    #[test]
    fn date_valid_for_scorable_anchor() {
        let report = assess_fields(&doc_with_anchor(DocumentKind::Contract, Confidence::High));
        assert_eq!(report.date.validity, Validity::Valid);
        assert_eq!(report.date.confidence, Confidence::High);
        assert_eq!(report.date.reason_code, "date_anchor_valid");
    }

    #[test]
    fn date_invalid_for_low_confidence() {
        let report = assess_fields(&doc_with_anchor(DocumentKind::Contract, Confidence::Low));
        assert_eq!(report.date.validity, Validity::Invalid);
        assert_eq!(report.date.reason_code, "date_low_confidence");
    }

    #[test]
    fn date_na_for_procedural_lane() {
        let report = assess_fields(&doc_with_anchor(DocumentKind::Notice, Confidence::High));
        assert_eq!(report.date.validity, Validity::NotApplicable);
        assert_eq!(report.date.reason_code, "date_not_scored_lane");
    }

    #[test]
    fn date_missing_anchor() {
        let mut doc = EvidenceDocument::new("e.pdf", "/in/e.pdf", SourceBucket::General);
        doc.kind = DocumentKind::Contract;
        let report = assess_fields(&doc);
        assert_eq!(report.date.reason_code, "date_anchor_missing");
    }

    #[test]
    fn amount_na_outside_trade() {
        let mut doc = doc_with_anchor(DocumentKind::Photo, Confidence::High);
        doc.trade_amount = Some("4200".into());
        let report = assess_fields(&doc);
        assert_eq!(report.amount.validity, Validity::NotApplicable);
        assert_eq!(report.party.validity, Validity::NotApplicable);
    }

    #[test]
    fn amount_parses_formatted_values() {
        let mut doc = doc_with_anchor(DocumentKind::Invoice, Confidence::High);
        doc.trade_amount = Some("total 42,000.00 CNY".into());
        let report = assess_fields(&doc);
        assert_eq!(report.amount.validity, Validity::Valid);
        assert_eq!(report.amount.confidence, Confidence::High);
    }

    #[test]
    fn amount_zero_is_invalid() {
        let mut doc = doc_with_anchor(DocumentKind::Invoice, Confidence::High);
        doc.trade_amount = Some("0.00".into());
        let report = assess_fields(&doc);
        assert_eq!(report.amount.reason_code, "amount_parse_failed");
    }

    #[test]
    fn amount_missing_for_trade_doc() {
        let doc = doc_with_anchor(DocumentKind::Contract, Confidence::High);
        let report = assess_fields(&doc);
        assert_eq!(report.amount.reason_code, "amount_missing");
    }

    #[test]
    fn party_entity_suffix_is_high() {
        let mut doc = doc_with_anchor(DocumentKind::Contract, Confidence::High);
        doc.counterparty = Some("Northwind Trading Co".into());
        let report = assess_fields(&doc);
        assert_eq!(report.party.confidence, Confidence::High);
        assert_eq!(report.party.reason_code, "party_entity_named");
    }

    #[test]
    fn party_plain_name_is_medium() {
        let mut doc = doc_with_anchor(DocumentKind::Contract, Confidence::High);
        doc.counterparty = Some("Jordan Miller".into());
        let report = assess_fields(&doc);
        assert_eq!(report.party.confidence, Confidence::Medium);
        assert!(report.party.is_valid());
    }

    #[test]
    fn party_generic_token_rejected() {
        let mut doc = doc_with_anchor(DocumentKind::Contract, Confidence::High);
        doc.counterparty = Some("buyer".into());
        let report = assess_fields(&doc);
        assert_eq!(report.party.reason_code, "party_generic");
    }

    #[test]
    fn party_too_short_rejected() {
        let mut doc = doc_with_anchor(DocumentKind::Contract, Confidence::High);
        doc.counterparty = Some("A".into());
        let report = assess_fields(&doc);
        assert_eq!(report.party.reason_code, "party_too_short");
    }

    #[test]
    fn goods_tiers() {
        let mut doc = doc_with_anchor(DocumentKind::Photo, Confidence::High);
        doc.goods_match = GoodsMatch::Direct;
        assert_eq!(assess_fields(&doc).goods.confidence, Confidence::High);
        doc.goods_match = GoodsMatch::Synonym;
        assert!(assess_fields(&doc).goods.is_valid());
        doc.goods_match = GoodsMatch::Unmatched;
        assert_eq!(assess_fields(&doc).goods.validity, Validity::Invalid);
        doc.goods_match = GoodsMatch::Missing;
        assert_eq!(assess_fields(&doc).goods.reason_code, "goods_missing");
    }

    #[test]
    fn mark_presence_needs_confidence() {
        let mut doc = doc_with_anchor(DocumentKind::Photo, Confidence::High);
        doc.mark_shown = true;
        doc.mark_name_confidence = Confidence::Medium;
        assert!(assess_fields(&doc).mark_presence.is_valid());
        doc.mark_name_confidence = Confidence::Low;
        assert_eq!(
            assess_fields(&doc).mark_presence.reason_code,
            "mark_low_confidence"
        );
        doc.mark_shown = false;
        assert_eq!(
            assess_fields(&doc).mark_presence.reason_code,
            "mark_not_shown"
        );
    }

    #[test]
    fn parse_amount_picks_largest_number() {
        assert_eq!(parse_amount("3 items, 42,000.00 total"), Some(42000.0));
        assert_eq!(parse_amount("no numbers"), None);
    }
}
