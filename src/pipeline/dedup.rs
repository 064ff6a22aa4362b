//! Content-addressed deduplication.
//!
//! Documents carrying materially identical recognized content collapse
//! into one canonical record. The primary signature hashes the
//! whitespace/punctuation-stripped text (bounded) together with up to
//! three extracted date fingerprints; near-empty recognition falls back
//! to a carrier-shape tuple so two blank scans of different files never
//! merge. Duplicates are recorded, never discarded.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::document::EvidenceDocument;
use crate::pipeline::extraction::dates;

/// Stripped text beyond this many characters does not influence the
/// signature; recognizer tails are noisy and the head identifies the
/// document.
const SIGNATURE_TEXT_BOUND: usize = 2000;

/// Below this stripped length the text signature is unreliable and the
/// fallback tuple takes over.
const NEAR_EMPTY_BOUND: usize = 80;

/// How many extracted dates feed the fingerprint.
const DATE_FINGERPRINT_COUNT: usize = 3;

/// Dedup result: the canonical ids in input order plus the duplicate
/// cross-reference map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupReport {
    pub canonical: Vec<Uuid>,
    /// duplicate document id → canonical document id
    pub duplicate_of: HashMap<Uuid, Uuid>,
}

impl DedupReport {
    pub fn duplicate_count(&self) -> usize {
        self.duplicate_of.len()
    }
}

/// Collapse duplicates in place: the first document observed with a
/// signature becomes canonical; later holders get `duplicate_of` set and
/// bump the canonical's merged count.
pub fn dedup(documents: &mut [EvidenceDocument]) -> DedupReport {
    let mut by_signature: HashMap<String, usize> = HashMap::new();
    let mut report = DedupReport::default();

    let signatures: Vec<String> = documents.iter().map(signature).collect();
    for idx in 0..documents.len() {
        let sig = &signatures[idx];
        match by_signature.get(sig) {
            None => {
                by_signature.insert(sig.clone(), idx);
                report.canonical.push(documents[idx].id);
            }
            Some(&canonical_idx) => {
                let canonical_id = documents[canonical_idx].id;
                documents[idx].duplicate_of = Some(canonical_id);
                documents[canonical_idx].merged_duplicates += 1;
                report.duplicate_of.insert(documents[idx].id, canonical_id);
                tracing::info!(
                    duplicate = %documents[idx].name,
                    canonical = %documents[canonical_idx].name,
                    "Duplicate content collapsed"
                );
            }
        }
    }
    report
}

/// Signature for one document's current state.
pub fn signature(doc: &EvidenceDocument) -> String {
    let stripped = strip_text(&doc.text);
    let fingerprint = date_fingerprint(&doc.text);

    if stripped.len() < NEAR_EMPTY_BOUND {
        // near-empty recognition: hash the carrier shape instead
        return digest(&format!(
            "fallback|{}|{}|{}|{}",
            doc.name_stem(),
            doc.page_count,
            doc.text.len(),
            fingerprint
        ));
    }

    let bounded: String = stripped.chars().take(SIGNATURE_TEXT_BOUND).collect();
    digest(&format!("content|{bounded}|{fingerprint}"))
}

fn strip_text(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

fn date_fingerprint(text: &str) -> String {
    let mut found: Vec<NaiveDate> = text.lines().flat_map(dates::exact_dates).collect();
    found.sort();
    found.dedup();
    found
        .into_iter()
        .take(DATE_FINGERPRINT_COUNT)
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
