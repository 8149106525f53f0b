//! Query construction errors

use thiserror::Error;

use crate::coerce::CoercionError;

/// Result type for query construction
pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Search is not enabled for '{table}'")]
    SearchDisabled { table: String },

    #[error("Unknown column '{column}' on '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("'{table}' has no primary key")]
    MissingPrimaryKey { table: String },

    #[error(transparent)]
    Coercion(#[from] CoercionError),
}
