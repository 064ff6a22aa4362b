pub mod controller;
pub mod signal;
pub mod trigger;

pub use controller::{ScanController, ScanOutcome};

use serde::{Deserialize, Serialize};

use crate::models::case::CaseFields;
use crate::models::document::EvidenceDocument;

/// Audit record for one scan round. Created once per round, immutable
/// after creation, appended to the run's audit trail. Rounds whose
/// trigger evaluated false are recorded too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRound {
    pub ordinal: u8,
    pub title: String,
    pub goal: String,
    pub selected_documents: usize,
    pub page_budget: u32,
    pub dpi: u32,
    pub triggered: bool,
    pub rationale: String,
}

/// Case-metadata collaborator: pattern-matches the merged texts into a
/// best-guess set of case fields. External to this crate's core; the
/// engine treats the guess as authoritative below manual overrides.
pub trait CaseMetadataSource {
    fn extract_case_fields(&self, documents: &[EvidenceDocument]) -> CaseFields;
}

/// Mock metadata source returning a fixed guess, for tests.
pub struct MockMetadataSource {
    pub guess: CaseFields,
}

impl MockMetadataSource {
    pub fn new(guess: CaseFields) -> Self {
        Self { guess }
    }

    pub fn empty() -> Self {
        Self {
            guess: CaseFields::default(),
        }
    }
}

impl CaseMetadataSource for MockMetadataSource {
    fn extract_case_fields(&self, _documents: &[EvidenceDocument]) -> CaseFields {
        self.guess.clone()
    }
}
