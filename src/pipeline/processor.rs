//! Case analysis orchestrator.
//!
//! Single entry point that drives the full pipeline: adaptive scan
//! rounds → per-document anchor resolution over the final merged text →
//! deduplication → risk diagnostics → report assembly.
//!
//! Uses trait-based DI for the external collaborators (OcrEngine,
//! CaseMetadataSource) so the orchestrator remains fully testable with
//! mock implementations. The run is sequential; it never aborts on
//! missing or malformed input, every failure path degrades a score or
//! sets a flag in the report.

use chrono::NaiveDate;

use crate::models::case::CaseFields;
use crate::models::document::EvidenceDocument;
use crate::models::enums::ScanMode;
use crate::pipeline::anchor::{resolve, ResolverContext};
use crate::pipeline::dedup;
use crate::pipeline::extraction::channels;
use crate::pipeline::extraction::types::OcrEngine;
use crate::pipeline::normalize;
use crate::pipeline::scan::{CaseMetadataSource, ScanController};
use crate::report::{build_report, DiagnosticsReport};
use crate::rules::{Lexicons, RuleProfile};
use crate::scoring::diagnostics::build_diagnostics;

pub struct CasePipeline<'a> {
    ocr: &'a dyn OcrEngine,
    metadata: &'a dyn CaseMetadataSource,
    profile: &'a RuleProfile,
    lexicons: &'a Lexicons,
    mode: ScanMode,
    today: NaiveDate,
}

impl<'a> CasePipeline<'a> {
    pub fn new(
        ocr: &'a dyn OcrEngine,
        metadata: &'a dyn CaseMetadataSource,
        profile: &'a RuleProfile,
        lexicons: &'a Lexicons,
        mode: ScanMode,
        today: NaiveDate,
    ) -> Self {
        Self {
            ocr,
            metadata,
            profile,
            lexicons,
            mode,
            today,
        }
    }

    /// Analyze one case: documents in, diagnostics report out.
    ///
    /// `manual` carries operator-supplied case-field overrides; they
    /// outrank the metadata collaborator's guess field by field.
    pub fn analyze(
        &self,
        documents: &mut Vec<EvidenceDocument>,
        manual: &CaseFields,
    ) -> DiagnosticsReport {
        tracing::info!(documents = documents.len(), mode = %self.mode, "Case analysis starting");

        // 1. adaptive scan rounds accumulate text and case fields
        let controller = ScanController::new(
            self.ocr,
            self.metadata,
            &self.profile.time,
            self.lexicons,
            self.mode,
            self.today,
        );
        let scan = controller.run(documents, manual);
        let period = scan.case_fields.period;

        // 2. resolve each document's anchor from its *current* merged text
        for doc in documents.iter_mut() {
            let text = normalize::normalize(&doc.text);
            let candidates =
                channels::extract_all(&text, self.lexicons, period.as_ref(), self.today);
            let ctx = ResolverContext {
                kind: doc.kind,
                period: period.as_ref(),
                formation_date: doc.formation_date,
                weights: &self.profile.time.anchor_weights,
                lexicons: self.lexicons,
            };
            doc.anchor = Some(resolve(&candidates, &ctx));
        }

        // 3. collapse materially identical documents
        let dedup_report = dedup::dedup(documents);

        // 4. aggregate into the risk diagnosis
        let diagnostics = build_diagnostics(
            documents,
            period.as_ref(),
            &self.profile.time,
            &self.profile.scoring,
        );

        // 5. assemble the report
        build_report(
            scan.case_fields,
            diagnostics,
            dedup_report,
            scan.rounds,
            self.profile,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::case::DefinedPeriod;
    use crate::models::enums::{
        Confidence, DocumentKind, GoodsMatch, RiskLevel, SourceBucket, TargetCode,
    };
    use crate::pipeline::extraction::types::MockOcrEngine;
    use crate::pipeline::scan::MockMetadataSource;
    use crate::scoring::diagnostics::GateCode;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn today() -> NaiveDate {
        d(2026, 8, 1)
    }

    fn complete_fields() -> CaseFields {
        CaseFields {
            registration_no: Some("1234567".into()),
            class_no: Some("25".into()),
            applicant: Some("Acme Holdings Ltd".into()),
            respondent: Some("Registrant Co".into()),
            mark_name: Some("NORTHWIND".into()),
            goods_services: Some("insulated bottles".into()),
            period: Some(DefinedPeriod::new(d(2022, 1, 1), d(2024, 12, 31))),
        }
    }

    fn strong_trade_doc(name: &str) -> EvidenceDocument {
        let mut doc = EvidenceDocument::new(name, format!("/in/{name}"), SourceBucket::Full);
        doc.kind = DocumentKind::Invoice;
        doc.goods_match = GoodsMatch::Direct;
        doc.mark_shown = true;
        doc.mark_name_confidence = Confidence::High;
        doc.subject_matched = true;
        doc.explicit_loop = true;
        doc.verifiable = true;
        doc.trade_amount = Some("42,000.00".into());
        doc.counterparty = Some("Northwind Trading Co".into());
        doc.claimed_targets = TargetCode::all().to_vec();
        doc
    }

    fn strong_text() -> &'static str {
        "NORTHWIND insulated bottles\n\
         order placed 2023-04-15, payment received 2023-04-16\n\
         shipped on 2023-04-18 with tracking\n\
         invoice total 42,000.00 to Northwind Trading Co"
    }

    #[test]
    fn end_to_end_strong_case_is_best_tier() {
        // distinct carrier text per document so dedup keeps them apart,
        // and enough documents to clear the anchor-minimum floors
        let mut ocr = MockOcrEngine::new("");
        for i in 0..10 {
            ocr = ocr.with_response(
                &format!("/in/invoice_{i}.pdf"),
                &format!("{}\nsupplementary order note {i}", strong_text()),
            );
        }
        let meta = MockMetadataSource::new(complete_fields());
        let profile = RuleProfile::default();
        let lex = Lexicons::default();
        let pipeline = CasePipeline::new(&ocr, &meta, &profile, &lex, ScanMode::Full, today());

        let mut documents: Vec<EvidenceDocument> = (0..10)
            .map(|i| strong_trade_doc(&format!("invoice_{i}.pdf")))
            .collect();
        let report = pipeline.analyze(&mut documents, &CaseFields::default());

        assert_eq!(report.risk_level, RiskLevel::A);
        for code in [
            GateCode::G1a,
            GateCode::G1b,
            GateCode::G1c,
            GateCode::G1d,
            GateCode::G2,
            GateCode::G3,
            GateCode::G4,
            GateCode::G5,
            GateCode::G6,
        ] {
            assert!(!report.diagnostics.gates.is_set(code), "{code:?} fired");
        }
        assert_eq!(report.diagnostics.summary.in_period_highmed, 10);
        assert_eq!(report.reason_chain.decision, "PASS");
        assert!(report.rounds.iter().take(2).all(|r| r.triggered));
    }

    #[test]
    fn empty_document_set_is_worst_tier() {
        let ocr = MockOcrEngine::new("");
        let meta = MockMetadataSource::new(complete_fields());
        let profile = RuleProfile::default();
        let lex = Lexicons::default();
        let pipeline = CasePipeline::new(&ocr, &meta, &profile, &lex, ScanMode::Full, today());

        let mut documents = Vec::new();
        let report = pipeline.analyze(&mut documents, &CaseFields::default());

        assert_eq!(report.risk_level, RiskLevel::E);
        assert!(report.diagnostics.gates.is_set(GateCode::G1b));
        assert_eq!(report.diagnostics.dim_scores.time, 40.0);
    }

    #[test]
    fn unresolved_period_degrades_never_aborts() {
        let ocr = MockOcrEngine::new(strong_text());
        // collaborator finds nothing, no manual override: period unresolved
        let meta = MockMetadataSource::empty();
        let profile = RuleProfile::default();
        let lex = Lexicons::default();
        let pipeline = CasePipeline::new(&ocr, &meta, &profile, &lex, ScanMode::Full, today());

        let mut documents = vec![strong_trade_doc("invoice_0.pdf")];
        let report = pipeline.analyze(&mut documents, &CaseFields::default());

        assert!(report.diagnostics.gates.is_set(GateCode::G1a));
        assert_eq!(report.risk_level, RiskLevel::E);
        assert!(report.period_segments.is_empty());
    }

    #[test]
    fn contradiction_scenario_lists_document() {
        let ocr = MockOcrEngine::new(strong_text());
        let meta = MockMetadataSource::new(complete_fields());
        let profile = RuleProfile::default();
        let lex = Lexicons::default();
        let pipeline = CasePipeline::new(&ocr, &meta, &profile, &lex, ScanMode::Full, today());

        let mut doc = strong_trade_doc("backdated.pdf");
        // formation date far on both sides of the resolved 2023-04 anchor
        doc.formation_date = Some(d(2021, 6, 1));
        let mut documents = vec![doc];
        let report = pipeline.analyze(&mut documents, &CaseFields::default());

        assert_eq!(report.diagnostics.summary.contradictions, 1);
        assert!(report.diagnostics.gates.details(GateCode::G1d)[0].contains("backdated.pdf"));
    }

    #[test]
    fn duplicate_documents_collapse_in_report() {
        let ocr = MockOcrEngine::new(strong_text());
        let meta = MockMetadataSource::new(complete_fields());
        let profile = RuleProfile::default();
        let lex = Lexicons::default();
        let pipeline = CasePipeline::new(&ocr, &meta, &profile, &lex, ScanMode::Full, today());

        let mut documents = vec![
            strong_trade_doc("invoice_a.pdf"),
            strong_trade_doc("invoice_b.pdf"),
        ];
        let report = pipeline.analyze(&mut documents, &CaseFields::default());

        // identical OCR text for both carriers → one canonical record
        assert_eq!(report.dedup.duplicate_count(), 1);
        assert_eq!(report.diagnostics.summary.total, 1);
        assert_eq!(report.diagnostics.summary.merged_duplicates, 1);
    }

    #[test]
    fn anchors_derive_from_final_merged_text() {
        let ocr = MockOcrEngine::new(strong_text());
        let meta = MockMetadataSource::new(complete_fields());
        let profile = RuleProfile::default();
        let lex = Lexicons::default();
        let pipeline = CasePipeline::new(&ocr, &meta, &profile, &lex, ScanMode::Full, today());

        let mut documents = vec![strong_trade_doc("invoice_0.pdf")];
        pipeline.analyze(&mut documents, &CaseFields::default());

        let anchor = documents[0].anchor.as_ref().unwrap();
        assert!(anchor.is_resolved());
        let range = anchor.range.unwrap();
        assert_eq!(range.start, d(2023, 4, 15));
        assert_eq!(range.end, d(2023, 4, 18));
        assert!(anchor.confidence.is_scorable());
    }

    #[test]
    fn manual_period_override_wins() {
        let ocr = MockOcrEngine::new(strong_text());
        let meta = MockMetadataSource::new(complete_fields());
        let profile = RuleProfile::default();
        let lex = Lexicons::default();
        let pipeline = CasePipeline::new(&ocr, &meta, &profile, &lex, ScanMode::Full, today());

        let manual = CaseFields {
            period: Some(DefinedPeriod::new(d(2010, 1, 1), d(2012, 12, 31))),
            ..Default::default()
        };
        let mut documents = vec![strong_trade_doc("invoice_0.pdf")];
        let report = pipeline.analyze(&mut documents, &manual);

        assert_eq!(report.case_fields.period.unwrap().start, d(2010, 1, 1));
        // all anchors fall outside the overridden window
        assert_eq!(report.diagnostics.summary.in_period_highmed, 0);
    }
}
