//! Target-code eligibility.
//!
//! A document can claim a target code in its classification yet be
//! excluded from *scored* coverage for that code when the backing field
//! is invalid: time-of-use needs a valid date, goods mapping a valid
//! goods match, mark presence a valid mark field, and a commercial loop
//! needs both amount and party.

use crate::models::document::EvidenceDocument;
use crate::models::enums::TargetCode;

use super::fields::FieldReport;

/// Filter a document's claimed target codes down to the ones its field
/// validity actually backs.
pub fn eligible_targets(doc: &EvidenceDocument, report: &FieldReport) -> Vec<TargetCode> {
    doc.claimed_targets
        .iter()
        .copied()
        .filter(|t| match t {
            TargetCode::T2 => report.mark_presence.is_valid(),
            TargetCode::T3 => report.goods.is_valid(),
            TargetCode::T4 => report.date.is_valid(),
            TargetCode::T6 => report.amount.is_valid() && report.party.is_valid(),
            TargetCode::T1 | TargetCode::T5 => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::anchor::{DateRange, TimeAnchor};
    use crate::models::enums::{
        AnchorType, Channel, Confidence, DocumentKind, GoodsMatch, SourceBucket,
    };
    use crate::scoring::fields::assess_fields;
    use chrono::NaiveDate;

    fn full_doc() -> EvidenceDocument {
        let mut doc = EvidenceDocument::new("inv.pdf", "/in/inv.pdf", SourceBucket::Full);
        doc.kind = DocumentKind::Invoice;
        doc.goods_match = GoodsMatch::Direct;
        doc.mark_shown = true;
        doc.mark_name_confidence = Confidence::High;
        doc.trade_amount = Some("42,000.00".into());
        doc.counterparty = Some("Northwind Trading Co".into());
        doc.claimed_targets = TargetCode::all().to_vec();
        doc.anchor = Some(TimeAnchor {
            range: Some(DateRange::single(
                NaiveDate::from_ymd_opt(2023, 4, 15).unwrap(),
            )),
            confidence: Confidence::High,
            anchor_type: AnchorType::TransactionDate,
            source_channel: Channel::Order,
            conflict: false,
            candidates: Vec::new(),
            selection_rule: "test".into(),
        });
        doc
    }

    #[test]
    fn fully_backed_document_keeps_all_targets() {
        let doc = full_doc();
        let report = assess_fields(&doc);
        assert_eq!(eligible_targets(&doc, &report).len(), 6);
    }

    #[test]
    fn invalid_date_drops_t4_only() {
        let mut doc = full_doc();
        doc.anchor = None;
        let report = assess_fields(&doc);
        let targets = eligible_targets(&doc, &report);
        assert!(!targets.contains(&TargetCode::T4));
        assert!(targets.contains(&TargetCode::T3));
        assert!(targets.contains(&TargetCode::T6));
    }

    #[test]
    fn invalid_goods_drops_t3() {
        let mut doc = full_doc();
        doc.goods_match = GoodsMatch::Unmatched;
        let report = assess_fields(&doc);
        assert!(!eligible_targets(&doc, &report).contains(&TargetCode::T3));
    }

    #[test]
    fn t6_needs_both_amount_and_party() {
        let mut doc = full_doc();
        doc.counterparty = Some("buyer".into());
        let report = assess_fields(&doc);
        assert!(!eligible_targets(&doc, &report).contains(&TargetCode::T6));
    }

    #[test]
    fn t1_and_t5_are_unfiltered() {
        let mut doc = full_doc();
        doc.anchor = None;
        doc.goods_match = GoodsMatch::Missing;
        doc.mark_shown = false;
        doc.trade_amount = None;
        doc.counterparty = None;
        let report = assess_fields(&doc);
        let targets = eligible_targets(&doc, &report);
        assert_eq!(targets, vec![TargetCode::T1, TargetCode::T5]);
    }

    #[test]
    fn only_claimed_targets_are_considered() {
        let mut doc = full_doc();
        doc.claimed_targets = vec![TargetCode::T2, TargetCode::T4];
        let report = assess_fields(&doc);
        let targets = eligible_targets(&doc, &report);
        assert_eq!(targets, vec![TargetCode::T2, TargetCode::T4]);
    }
}
