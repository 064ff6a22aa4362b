//! The five-round adaptive scan controller.
//!
//! Owns the only mutable state of a run (per-document accumulated text
//! and the evolving case-field guess) and drives the OCR collaborator at
//! rising budgets. Round 1 prioritizes notice/fact-like documents, round
//! 2 is the full baseline, rounds 3-5 re-scan a capped priority subset
//! when the trigger function says more signal is needed. OCR failures
//! degrade the affected document silently; a round always runs to
//! completion.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::case::CaseFields;
use crate::models::document::EvidenceDocument;
use crate::models::enums::{ScanMode, SourceBucket};
use crate::pipeline::extraction::types::{OcrEngine, ScanBudget};
use crate::pipeline::normalize;
use crate::rules::{Lexicons, TimeRules};

use super::signal::signal_score;
use super::trigger::{evaluate_round, select_rescan};
use super::{CaseMetadataSource, ScanRound};

/// Result of a full controller run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// One record per round, including rounds whose trigger was false.
    pub rounds: Vec<ScanRound>,
    /// Final merged case fields (manual overrides already applied).
    pub case_fields: CaseFields,
}

pub struct ScanController<'a> {
    ocr: &'a dyn OcrEngine,
    metadata: &'a dyn CaseMetadataSource,
    rules: &'a TimeRules,
    lexicons: &'a Lexicons,
    mode: ScanMode,
    today: NaiveDate,
}

impl<'a> ScanController<'a> {
    pub fn new(
        ocr: &'a dyn OcrEngine,
        metadata: &'a dyn CaseMetadataSource,
        rules: &'a TimeRules,
        lexicons: &'a Lexicons,
        mode: ScanMode,
        today: NaiveDate,
    ) -> Self {
        Self {
            ocr,
            metadata,
            rules,
            lexicons,
            mode,
            today,
        }
    }

    /// Run all five rounds over the document set.
    ///
    /// `manual` carries operator-supplied case fields; they outrank every
    /// collaborator guess, field by field, at every refinement step.
    pub fn run(&self, documents: &mut [EvidenceDocument], manual: &CaseFields) -> ScanOutcome {
        let budgets = &self.rules.scan_budgets;
        let mut guess = CaseFields::default();
        let mut rounds = Vec::with_capacity(5);
        // highest page budget each document has been scanned at
        let mut pages_requested = vec![0u32; documents.len()];

        for doc in documents.iter_mut() {
            doc.scan_mode = resolve_scan_mode(self.mode, doc.bucket);
        }

        for ordinal in 1..=5u8 {
            let effective = guess.overlay(manual);
            let signals: Vec<f64> = documents
                .iter()
                .map(|d| signal_score(d, self.lexicons, &effective, self.today))
                .collect();
            let decision =
                evaluate_round(ordinal, self.mode, &effective, &signals, &self.rules.round_triggers);

            if !decision.trigger {
                tracing::info!(round = ordinal, rationale = %decision.rationale, "Round skipped");
                rounds.push(self.round_record(ordinal, 0, ScanBudget { max_pages: 0, dpi: 0 }, &decision.rationale, false));
                continue;
            }

            let (selected, budget) = self.plan_round(ordinal, documents, &signals, &pages_requested);
            tracing::info!(
                round = ordinal,
                selected = selected.len(),
                pages = budget.max_pages,
                dpi = budget.dpi,
                rationale = %decision.rationale,
                "Round running"
            );

            for &idx in &selected {
                self.scan_document(&mut documents[idx], ordinal, budget, budgets.notice_pages, budgets.notice_dpi);
                pages_requested[idx] = pages_requested[idx].max(requested_pages(
                    ordinal,
                    &documents[idx],
                    budget,
                    self.lexicons,
                    budgets.notice_pages,
                ));
            }

            // refine the case-field guess from the freshly merged text
            let new_guess = self.metadata.extract_case_fields(documents);
            guess = guess.overlay(&new_guess);

            rounds.push(self.round_record(ordinal, selected.len(), budget, &decision.rationale, true));
        }

        ScanOutcome {
            rounds,
            case_fields: guess.overlay(manual),
        }
    }

    /// Which documents round `ordinal` scans, and at what base budget.
    fn plan_round(
        &self,
        ordinal: u8,
        documents: &[EvidenceDocument],
        signals: &[f64],
        pages_requested: &[u32],
    ) -> (Vec<usize>, ScanBudget) {
        let budgets = &self.rules.scan_budgets;
        match ordinal {
            // round 1: everything, notice-like documents get the elevated
            // budget inside scan_document
            1 | 2 => (
                (0..documents.len()).collect(),
                ScanBudget {
                    max_pages: budgets.base_pages,
                    dpi: budgets.base_dpi,
                },
            ),
            _ => {
                let idx = usize::from(ordinal - 3).min(2);
                let budget = ScanBudget {
                    max_pages: budgets.deep_pages[idx],
                    dpi: budgets.deep_dpi[idx],
                };
                let mut selected = select_rescan(
                    documents,
                    signals,
                    budgets,
                    &self.rules.round_triggers,
                    self.lexicons,
                );
                if ordinal == 5 {
                    // no point requesting more pages than the carrier has
                    selected.retain(|&i| {
                        let doc = &documents[i];
                        doc.page_count == 0 || doc.page_count > pages_requested[i]
                    });
                }
                (selected, budget)
            }
        }
    }

    /// Request OCR for one document and union-merge the result. Failures
    /// leave the accumulated text as it is: quality degrades, the run
    /// continues.
    fn scan_document(
        &self,
        doc: &mut EvidenceDocument,
        ordinal: u8,
        base_budget: ScanBudget,
        notice_pages: u32,
        notice_dpi: u32,
    ) {
        let budget = if ordinal == 1 && self.is_notice_like(doc) {
            ScanBudget {
                max_pages: notice_pages,
                dpi: notice_dpi,
            }
        } else {
            base_budget
        };

        match self.ocr.recognize(&doc.handle, budget) {
            Ok(raw) => {
                let cleaned = normalize::normalize(&raw);
                if doc.merge_text(&cleaned) {
                    tracing::debug!(document = %doc.name, round = ordinal, "Merged new text");
                }
            }
            Err(e) => {
                tracing::warn!(
                    document = %doc.name,
                    round = ordinal,
                    error = %e,
                    "OCR degraded — keeping previously extracted text"
                );
            }
        }
    }

    fn is_notice_like(&self, doc: &EvidenceDocument) -> bool {
        doc.kind.is_procedural()
            || Lexicons::hit(&doc.name.to_lowercase(), &self.lexicons.notice_names)
    }

    fn round_record(
        &self,
        ordinal: u8,
        selected: usize,
        budget: ScanBudget,
        rationale: &str,
        triggered: bool,
    ) -> ScanRound {
        let (title, goal) = match ordinal {
            1 => ("notice-first scan", "prioritize notice/fact-like documents for a first case-field guess"),
            2 => ("baseline scan", "full-set scan at default budget to refine case fields"),
            3 => ("first deep re-scan", "recover weak-signal documents at a raised budget"),
            4 => ("second deep re-scan", "recover remaining weak documents at a higher budget"),
            _ => ("final deep re-scan", "last-chance scan for documents with unread pages"),
        };
        ScanRound {
            ordinal,
            title: title.into(),
            goal: goal.into(),
            selected_documents: selected,
            page_budget: budget.max_pages,
            dpi: budget.dpi,
            triggered,
            rationale: rationale.into(),
        }
    }
}

/// A mix run resolves each document's effective mode from its source
/// bucket; fast/full runs apply uniformly.
fn resolve_scan_mode(run_mode: ScanMode, bucket: SourceBucket) -> ScanMode {
    match (run_mode, bucket) {
        (ScanMode::Mix, SourceBucket::Fast) => ScanMode::Fast,
        (ScanMode::Mix, _) => ScanMode::Full,
        (mode, _) => mode,
    }
}

fn requested_pages(
    ordinal: u8,
    doc: &EvidenceDocument,
    base_budget: ScanBudget,
    lexicons: &Lexicons,
    notice_pages: u32,
) -> u32 {
    if ordinal == 1
        && (doc.kind.is_procedural()
            || Lexicons::hit(&doc.name.to_lowercase(), &lexicons.notice_names))
    {
        notice_pages
    } else {
        base_budget.max_pages
    }
}
