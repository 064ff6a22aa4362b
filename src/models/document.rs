use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::anchor::TimeAnchor;
use super::enums::{
    Confidence, CoverageLane, DocumentKind, GoodsMatch, ScanMode, SourceBucket, TargetCode,
};

/// One evidentiary document as it moves through the pipeline.
///
/// Created when first discovered by the loader; the accumulated `text`
/// grows monotonically across scan rounds via union-merge and is never
/// overwritten. Classification flags come from the (external)
/// case-metadata extraction collaborator and may be refined between
/// rounds; the anchor is always re-derived from the current merged text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceDocument {
    pub id: Uuid,
    /// Display name, usually the source file name.
    pub name: String,
    /// Opaque carrier handle the OCR collaborator understands.
    pub handle: String,
    pub kind: DocumentKind,
    pub bucket: SourceBucket,
    pub scan_mode: ScanMode,
    pub page_count: u32,
    /// Accumulated recognized text, union-merged across rounds.
    pub text: String,
    /// Date the carrier itself was formed (file/container metadata).
    pub formation_date: Option<NaiveDate>,

    // Classification flags supplied by the metadata collaborator.
    pub mark_shown: bool,
    pub mark_name_confidence: Confidence,
    pub subject_matched: bool,
    pub explicit_loop: bool,
    pub verifiable: bool,
    pub goods_match: GoodsMatch,
    pub goods_text: String,
    pub trade_amount: Option<String>,
    pub counterparty: Option<String>,
    /// Target codes the document claims to prove; scoring re-filters these
    /// against field validity.
    pub claimed_targets: Vec<TargetCode>,

    /// Resolved by the anchor resolver after the final scan round.
    pub anchor: Option<TimeAnchor>,
    /// Set by the dedup engine on non-canonical documents.
    pub duplicate_of: Option<Uuid>,
    /// On canonical documents: how many duplicates were folded in.
    pub merged_duplicates: u32,
}

impl EvidenceDocument {
    /// A fresh document with nothing recognized yet.
    pub fn new(name: impl Into<String>, handle: impl Into<String>, bucket: SourceBucket) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            handle: handle.into(),
            kind: DocumentKind::Other,
            bucket,
            scan_mode: ScanMode::Mix,
            page_count: 0,
            text: String::new(),
            formation_date: None,
            mark_shown: false,
            mark_name_confidence: Confidence::Low,
            subject_matched: false,
            explicit_loop: false,
            verifiable: false,
            goods_match: GoodsMatch::Missing,
            goods_text: String::new(),
            trade_amount: None,
            counterparty: None,
            claimed_targets: Vec::new(),
            anchor: None,
            duplicate_of: None,
            merged_duplicates: 0,
        }
    }

    /// Name stem without the final extension, used by the dedup fallback
    /// signature.
    pub fn name_stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) if idx > 0 => &self.name[..idx],
            _ => &self.name,
        }
    }

    /// Union-merge newly recognized text into the accumulated text.
    ///
    /// Skips the append when the new text is already contained in the old
    /// (whitespace-trimmed), so repeated scans never duplicate content.
    /// Returns true when anything was appended.
    pub fn merge_text(&mut self, new_text: &str) -> bool {
        let incoming = new_text.trim();
        if incoming.is_empty() || self.text.contains(incoming) {
            return false;
        }
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(incoming);
        true
    }

    pub fn is_duplicate(&self) -> bool {
        self.duplicate_of.is_some()
    }

    /// Whether this document's time coverage counts as substantive proof
    /// or merely as reference material.
    pub fn coverage_lane(&self) -> CoverageLane {
        if self.kind.is_procedural() {
            CoverageLane::Reference
        } else {
            CoverageLane::Substantive
        }
    }
}
