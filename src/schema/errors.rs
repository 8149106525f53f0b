//! Schema error types
//!
//! Raised while introspecting a record type at registration time, or while
//! converting between typed instances and storage rows.

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema introspection and record conversion errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two flattened fields share a logical name
    #[error("Duplicate field '{field}' in table {table}")]
    DuplicateField { table: String, field: String },

    /// Two fields map to the same storage column
    #[error("Duplicate column '{column}' in table {table}")]
    DuplicateColumn { table: String, column: String },

    /// More than one field claims the same special designation
    #[error("Table {table} declares {designation} on both '{first}' and '{second}'")]
    DuplicateDesignation {
        table: String,
        designation: &'static str,
        first: String,
        second: String,
    },

    /// A special designation is attached to a field of the wrong type
    #[error("Column '{column}' in table {table} cannot be {designation}: type is {semantic}")]
    InvalidDesignation {
        table: String,
        designation: &'static str,
        column: String,
        semantic: &'static str,
    },

    /// Instance could not be converted to or from its record type
    #[error("Record conversion failed: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        SchemaError::Codec(err.to_string())
    }
}
