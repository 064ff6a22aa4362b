//! Context classification for candidate date lines.
//!
//! Decides what a date near a given line most plausibly *is* (a
//! transaction date, a machine-generated timestamp, a date the content
//! claims for itself), and whether noise-exclusion phrasing (validity
//! windows, license terms, inspection stamps) forcibly demotes it.

use crate::models::enums::{AnchorType, DocumentKind};
use crate::rules::Lexicons;

/// Classification of one candidate's context line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineContext {
    pub anchor_type: AnchorType,
    pub noise_excluded: bool,
}

/// Classify a candidate's source line. Transaction phrasing wins over
/// system phrasing, which wins over content claims; anything else is
/// uncertain. Noise exclusion is orthogonal and checked against the
/// global lexicon plus the document kind's extension.
pub fn classify_line(line: &str, kind: DocumentKind, lexicons: &Lexicons) -> LineContext {
    let lower = line.to_lowercase();
    let noise_excluded = lexicons.noise_hit(&lower, kind);

    let anchor_type = if Lexicons::hit(&lower, &lexicons.transaction_context) {
        AnchorType::TransactionDate
    } else if Lexicons::hit(&lower, &lexicons.system_context) {
        AnchorType::SystemGenerated
    } else if Lexicons::hit(&lower, &lexicons.content_context) {
        AnchorType::ContentClaimed
    } else {
        AnchorType::Uncertain
    };

    LineContext {
        anchor_type,
        noise_excluded,
    }
}
