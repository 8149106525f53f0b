//! # REST API Errors
//!
//! Every failure renders as `{"detail": "<message>"}` with a 4xx status.
//! The variants exist for logging; clients see one envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::coerce::CoercionError;
use crate::query::QueryError;
use crate::schema::SchemaError;
use crate::store::StoreError;

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

/// REST API errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestError {
    // ==================
    // Request Errors
    // ==================
    /// Malformed request parameter or body
    #[error("{0}")]
    Parse(String),

    /// Value could not be coerced to its field type
    #[error("{0}")]
    Coercion(#[from] CoercionError),

    /// Ownership scope value missing from the request context
    #[error("Missing scope value '{0}'")]
    MissingScope(String),

    /// No matching row, including rows outside the caller's scope
    #[error("Record not found")]
    NotFound,

    /// Path addresses no registered resource
    #[error("No resource at '{0}'")]
    UnknownRoute(String),

    /// Resource path exists but has no route for the method
    #[error("Method '{method}' is not allowed on '{path}'")]
    MethodNotAllowed { method: String, path: String },

    // ==================
    // Resource Errors
    // ==================
    /// Resource misconfiguration surfaced by a request
    #[error("{0}")]
    Config(String),

    /// Operation is disabled for this resource
    #[error("Operation '{operation}' is disabled for '{resource}'")]
    OperationDisabled { resource: String, operation: String },

    // ==================
    // Storage Errors
    // ==================
    /// Row store failure or zero affected rows
    #[error("{0}")]
    Persistence(String),
}

impl RestError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::NotFound | RestError::UnknownRoute(_) => StatusCode::NOT_FOUND,
            RestError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<QueryError> for RestError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Coercion(e) => RestError::Coercion(e),
            QueryError::UnknownColumn { .. } => RestError::Parse(err.to_string()),
            QueryError::SearchDisabled { .. } | QueryError::MissingPrimaryKey { .. } => {
                RestError::Config(err.to_string())
            }
        }
    }
}

impl From<StoreError> for RestError {
    fn from(err: StoreError) -> Self {
        RestError::Persistence(err.to_string())
    }
}

impl From<SchemaError> for RestError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::Codec(msg) => RestError::Parse(format!("Invalid record: {}", msg)),
            other => RestError::Config(other.to_string()),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl From<&RestError> for ErrorResponse {
    fn from(err: &RestError) -> Self {
        Self {
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        match &self {
            RestError::Persistence(_) | RestError::Config(_) => {
                warn!(error = %self, "Request failed")
            }
            _ => debug!(error = %self, "Request rejected"),
        }
        let body = Json(ErrorResponse::from(&self));
        (self.status_code(), body).into_response()
    }
}
