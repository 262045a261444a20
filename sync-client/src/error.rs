//! Error types for offsync-client.

use crate::config::ConfigError;
use offsync_types::SyncError;

/// Local medium errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be decoded.
    #[error("corrupt value under {key}: {reason}")]
    Corrupt {
        /// Medium key holding the value.
        key: String,
        /// What failed to decode.
        reason: String,
    },

    /// The medium cannot be reached.
    #[error("medium unavailable: {0}")]
    Unavailable(String),
}

/// Errors reported by a remote store collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The collaborator does not implement this operation.
    #[error("remote {operation} is not configured")]
    Unconfigured {
        /// The missing operation.
        operation: &'static str,
    },

    /// The remote store could not be reached.
    #[error("remote unreachable: {0}")]
    Unreachable(String),
}

/// Errors surfaced by the sync layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Required configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A key-dependent operation was called without a key.
    #[error("{operation} requires a key")]
    MissingKey {
        /// The operation that needed the key.
        operation: &'static str,
    },

    /// Remote collaborator error.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// The local medium was not usable when the layer was built.
    #[error("local storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Local medium error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Record or key model error.
    #[error("model error: {0}")]
    Model(#[from] SyncError),

    /// Configuration file error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for sync layer operations.
pub type Result<T> = std::result::Result<T, ClientError>;
