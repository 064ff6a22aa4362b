pub mod diagnostics;
pub mod fields;
pub mod risk;
pub mod targets;

pub use diagnostics::{build_diagnostics, CaseDiagnostics, DiagnosticsSummary, EvidenceRow};
pub use fields::{assess_fields, FieldAssessment, FieldReport};
pub use risk::{derive_risk_level, meets_anchor_minimum};
pub use targets::eligible_targets;
