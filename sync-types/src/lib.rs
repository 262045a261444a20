//! # sync-types
//!
//! Data model for the offsync offline-first sync layer.
//!
//! This crate provides the foundational types used across all offsync crates:
//! - [`Record`] - An arbitrary field-name to JSON-value mapping
//! - [`PrimaryKey`], [`RecordKey`] - Key configuration and concrete keys
//! - [`StoredEntry`] - The unit persisted in the local store
//! - [`SyncError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod entry;
mod error;
mod keys;

pub use entry::{StoredEntry, LOCAL_KEY_FIELD};
pub use error::SyncError;
pub use keys::{render_key_value, PrimaryKey, RecordKey, COMPOUND_SEPARATOR};

/// A record: arbitrary mapping from field name to value.
pub type Record = serde_json::Map<String, serde_json::Value>;
