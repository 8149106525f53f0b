//! Cache errors
//!
//! Never surfaced to clients: callers log these and fall through to live
//! execution.

use thiserror::Error;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Transport or backend failure, distinct from a missing key
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// Payload could not be encoded for storage
    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}
