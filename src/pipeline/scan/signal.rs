//! Per-document signal strength.
//!
//! A heuristic measure of how much usable information a document's
//! current text carries: recognized length, scene-lexicon hits, a
//! mark/goods hint match against the case fields, and whether any date is
//! extractable at all. Drives the decision of which documents a later
//! round re-scans.

use chrono::NaiveDate;

use crate::models::case::CaseFields;
use crate::models::document::EvidenceDocument;
use crate::pipeline::extraction::dates;
use crate::rules::Lexicons;

/// Text length at which the length component saturates.
const LENGTH_SATURATION: usize = 400;

/// Scene-lexicon hits at which the lexicon component saturates.
const LEXICON_SATURATION: usize = 3;

const LENGTH_WEIGHT: f64 = 0.30;
const LEXICON_WEIGHT: f64 = 0.25;
const HINT_WEIGHT: f64 = 0.20;
const DATE_WEIGHT: f64 = 0.25;

/// Signal score in [0, 1]. Higher means the document already yielded
/// enough to work with; low scores mark re-scan candidates.
pub fn signal_score(
    doc: &EvidenceDocument,
    lexicons: &Lexicons,
    case: &CaseFields,
    today: NaiveDate,
) -> f64 {
    let lower = doc.text.to_lowercase();

    let length = (doc.text.chars().count() as f64 / LENGTH_SATURATION as f64).min(1.0);
    let lexicon =
        (lexicons.scene_hit_count(&lower) as f64 / LEXICON_SATURATION as f64).min(1.0);
    let hints = hint_component(&lower, case);
    let period = case.period.as_ref();
    let has_date = doc
        .text
        .lines()
        .any(|line| !dates::dates_in_line(line, period, today).is_empty());

    LENGTH_WEIGHT * length
        + LEXICON_WEIGHT * lexicon
        + HINT_WEIGHT * hints
        + DATE_WEIGHT * if has_date { 1.0 } else { 0.0 }
}

/// Mark/goods hint match. With no hints known yet the component is
/// neutral: a document cannot be punished for hints nobody has supplied.
fn hint_component(text_lower: &str, case: &CaseFields) -> f64 {
    let mark = case.mark_name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let goods = case
        .goods_services
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match (mark, goods) {
        (None, None) => 0.5,
        (mark, goods) => {
            let mark_hit = mark.is_some_and(|m| text_lower.contains(&m.to_lowercase()));
            let goods_hit = goods.is_some_and(|g| {
                // any word of the goods description counts
                g.to_lowercase()
                    .split_whitespace()
                    .any(|w| w.len() >= 3 && text_lower.contains(w))
            });
            if mark_hit || goods_hit {
                1.0
            } else {
                0.0
            }
        }
    }
}
