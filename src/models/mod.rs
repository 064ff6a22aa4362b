pub mod anchor;
pub mod case;
pub mod document;
pub mod enums;

use thiserror::Error;

/// Errors raised when parsing persisted/external model values.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid value '{value}' for {field}")]
    InvalidEnum { field: String, value: String },
}
