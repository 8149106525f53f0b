//! Registration errors
//!
//! All of these are raised while building the registry at startup; none
//! can occur at request time.

use thiserror::Error;

use crate::schema::SchemaError;

/// Result type for registration
pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Type '{0}' has no reflectable fields")]
    EmptySchema(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Resource path '{0}' is already registered")]
    DuplicatePath(String),

    #[error("Search column '{column}' is not a column of '{resource}'")]
    UnknownSearchColumn { resource: String, column: String },

    #[error("Ownership field '{field}' is not a field of '{resource}'")]
    UnknownOwnerField { resource: String, field: String },

    #[error("Ownership field '{field}' of '{resource}' has unsupported type {semantic}")]
    UnsupportedOwnerType {
        resource: String,
        field: String,
        semantic: &'static str,
    },

    #[error("Resource '{0}' exposes keyed operations but has no primary key")]
    MissingPrimaryKey(String),

    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),
}
