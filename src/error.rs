//! Error types for the state engine
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache, filter and theme modules.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key or scope not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Backing key-value store failed (quota, I/O, poisoned lock)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Fetcher rejected and no fallback was configured
    #[error("{0}")]
    Fetch(String),

    /// Fetcher did not settle within the configured timeout
    #[error("Fetch timed out for key: {0}")]
    Timeout(String),

    /// A newer fetch for the same key superseded this one
    #[error("Fetch cancelled for key: {0}")]
    Cancelled(String),

    /// Seed color is not a valid hex color
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_)
            | CacheError::Serialization(_)
            | CacheError::InvalidColor(_) => StatusCode::BAD_REQUEST,
            CacheError::Fetch(_) => StatusCode::BAD_GATEWAY,
            CacheError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CacheError::Cancelled(_) => StatusCode::CONFLICT,
            CacheError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the state engine.
pub type Result<T> = std::result::Result<T, CacheError>;
