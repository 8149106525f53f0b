//! Row store errors

use thiserror::Error;

/// Result type for row store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend failure (connection, lock, driver)
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Write collides with an existing key
    #[error("Duplicate key '{key}' in '{table}'")]
    Conflict { table: String, key: String },
}
