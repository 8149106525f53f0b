//! Coercion error types

use thiserror::Error;

/// Result type for coercion
pub type CoercionResult<T> = Result<T, CoercionError>;

/// Raw request value could not become a typed field value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// Malformed timestamp; always fatal to the request
    #[error("Field '{field}' has invalid time '{value}', expected unix seconds or YYYY-MM-DD HH:MM:SS")]
    Timestamp { field: String, value: String },

    /// Malformed scalar under strict coercion, filters, or ownership values
    #[error("Field '{field}' has invalid value '{value}', expected {expected}")]
    Invalid {
        field: String,
        value: String,
        expected: &'static str,
    },

    /// Ownership column type cannot carry a scope value
    #[error("Ownership field '{field}' has unsupported type {semantic}")]
    UnsupportedOwnerType {
        field: String,
        semantic: &'static str,
    },
}
