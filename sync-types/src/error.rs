//! Error types for the offsync data model.

use thiserror::Error;

/// Errors raised while building keys or decoding stored entries.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A key could not be built from the given parts.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// JSON encoding or decoding failed
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
