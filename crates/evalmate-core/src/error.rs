//! Error types for document loading and collaborator services.
//!
//! `DocumentError` covers everything that can go wrong between a JSON file
//! on disk and the engine's input types. `ServiceError` classifies failures
//! of the external collaborators (agent, OCR, speech) so the pipeline can
//! downcast and decide whether to retry.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating exam documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or has no recognized top-level key.
    #[error("malformed document {source_name}: {reason}")]
    Malformed { source_name: String, reason: String },

    /// An entry in an otherwise well-formed document is invalid.
    #[error("invalid entry {entry}: {message}")]
    Validation { entry: String, message: String },
}

impl DocumentError {
    pub(crate) fn malformed(source_name: &str, reason: impl Into<String>) -> Self {
        DocumentError::Malformed {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn validation(entry: impl Into<String>, message: impl Into<String>) -> Self {
        DocumentError::Validation {
            entry: entry.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur when calling an external collaborator service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The service answered, but not in a shape we can use.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        match self {
            ServiceError::AuthenticationFailed(_) | ServiceError::InvalidResponse(_) => true,
            ServiceError::ApiError { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ServiceError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
