//! Error types for atlas.
//!
//! One `thiserror` enum covers the cache, aggregator and client layers.

use thiserror::Error;

/// Result type alias using `AtlasError`.
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Main error type for all atlas operations.
#[derive(Debug, Error)]
pub enum AtlasError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CACHE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Key is absent from the store.
    #[error("Key not found: {0}")]
    NotFound(String),

    /// A stored entry could not be decoded.
    #[error("Corrupt cache entry '{key}': {reason}")]
    CorruptEntry { key: String, reason: String },

    /// Store file is unreadable or malformed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Store file format version mismatch.
    #[error("Store version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    // ═══════════════════════════════════════════════════════════════════════════
    // AGGREGATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Record has no attribute with this name.
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// Aggregation name is not one of the supported groupings.
    #[error("Unknown aggregation: {0}")]
    UnknownAggregation(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary serialization error.
    #[error("Binary serialization error: {0}")]
    Serialization(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // NETWORK ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Location lookup failed or returned an unexpected payload.
    #[error("Geocoding failed: {0}")]
    Geocoding(String),

    /// The platform rejected a request.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    // ═══════════════════════════════════════════════════════════════════════════
    // STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Input validation failed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AtlasError {
    /// Returns true if this error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AtlasError::Http(_) | AtlasError::Geocoding(_))
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            AtlasError::Validation(_)
                | AtlasError::UnknownAggregation(_)
                | AtlasError::UnknownAttribute(_)
        )
    }

    /// Returns true if a store file exists but is not in a format we can read.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            AtlasError::Storage(_) | AtlasError::VersionMismatch { .. } | AtlasError::Serialization(_)
        )
    }

    /// Returns true if the error means "no such key".
    pub fn is_not_found(&self) -> bool {
        matches!(self, AtlasError::NotFound(_))
    }
}
