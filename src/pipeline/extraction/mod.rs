pub mod channels;
pub mod dates;
pub mod types;

use thiserror::Error;

/// Errors surfaced by the OCR collaborator boundary.
///
/// These never abort a run: the scan controller degrades the affected
/// document to whatever text it already holds.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("OCR timed out for {handle}")]
    Timeout { handle: String },

    #[error("OCR failed for {handle}: {reason}")]
    Failed { handle: String, reason: String },
}
