//! Error types for the media cache
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
/// Unified error type for the media cache.
///
/// The type is `Clone` because a single failed load is handed to every
/// caller that was waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The durable medium cannot be opened or used
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Fetching the remote asset failed (transport, status or timeout)
    #[error("Fetch failed for {locator}: {cause}")]
    FetchFailed { locator: String, cause: String },

    /// The durable medium rejected a write because it is full
    #[error("Quota exceeded on write: {0}")]
    QuotaExceededOnWrite(String),

    /// The locator cannot be turned into a cache key
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    /// Unknown or released local reference
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Builds a `FetchFailed` error for `locator`.
    pub fn fetch_failed(locator: impl Into<String>, cause: impl Into<String>) -> Self {
        CacheError::FetchFailed {
            locator: locator.into(),
            cause: cause.into(),
        }
    }

    /// Maps an I/O error from the durable medium.
    ///
    /// A full device becomes `QuotaExceededOnWrite`, anything else means the
    /// medium is unusable.
    pub fn from_io(context: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::StorageFull => {
                CacheError::QuotaExceededOnWrite(format!("{}: {}", context, err))
            }
            _ => CacheError::StorageUnavailable(format!("{}: {}", context, err)),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::FetchFailed { .. } => StatusCode::BAD_GATEWAY,
            CacheError::QuotaExceededOnWrite(_) => StatusCode::INSUFFICIENT_STORAGE,
            CacheError::InvalidLocator(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Fetch failures carry the locator so clients can fall back to it
        let body = match &self {
            CacheError::FetchFailed { locator, .. } => Json(json!({
                "error": self.to_string(),
                "locator": locator,
            })),
            _ => Json(json!({
                "error": self.to_string()
            })),
        };

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the media cache.
pub type Result<T> = std::result::Result<T, CacheError>;
