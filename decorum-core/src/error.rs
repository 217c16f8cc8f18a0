//! Error types for decorum.
//!
//! This module provides the error hierarchy shared by every decorum crate,
//! built with `thiserror`. Wrapped functions keep their own error type; they
//! only need `From<DecorumError>` so wrapper failures can be surfaced.

use thiserror::Error;

/// Result type alias using `DecorumError`.
pub type Result<T> = std::result::Result<T, DecorumError>;

/// Main error type for all decorum operations.
#[derive(Debug, Error)]
pub enum DecorumError {
    // ═══════════════════════════════════════════════════════════════════════════
    // KEY ENCODING ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// An argument has no stable textual form and cannot be part of a cache key.
    #[error("Cannot encode argument into cache key: {0}")]
    EncodingError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // BACKEND ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The external cache backend failed.
    #[error("Cache backend error: {0}")]
    BackendError(String),

    /// A cached value could not be converted back into the result type.
    #[error("Cached value for '{key}' has an unexpected shape: {reason}")]
    CorruptEntry { key: String, reason: String },

    // ═══════════════════════════════════════════════════════════════════════════
    // PROFILING ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A profile dump could not be parsed.
    #[error("{path} does not appear to be a valid file: {reason}")]
    InvalidProfile { path: String, reason: String },

    /// Unknown sort key for a stats report.
    #[error("Unknown sort key: {0}")]
    UnknownSortKey(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DecorumError {
    /// Returns true if this error came from encoding call arguments.
    pub fn is_encoding_error(&self) -> bool {
        matches!(self, DecorumError::EncodingError(_))
    }

    /// Returns true if retrying the same operation may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DecorumError::BackendError(_) | DecorumError::IoError(_)
        )
    }
}
