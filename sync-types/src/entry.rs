//! The unit persisted in the local store.

use crate::error::SyncError;
use crate::Record;
use serde::{Deserialize, Serialize};

/// Reserved field injected into records read from the local store.
///
/// Holds the storage token the record was read under so callers can hand it
/// back to write operations. Offline-created records carry it from the
/// moment their temporary key is issued.
pub const LOCAL_KEY_FIELD: &str = "_localKey";

/// A record plus its lifecycle flags, as stored under `<prefix><token>`.
///
/// Serialized form: `{"dirty":bool,"record"?:{..},"deleted"?:bool,"newRecord"?:bool}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Modified locally and not yet reconciled.
    pub dirty: bool,
    /// The wrapped payload. Tombstones have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<Record>,
    /// Marked for deletion at the next reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    /// Created locally under a temporary key.
    #[serde(
        rename = "newRecord",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub new_record: Option<bool>,
}

impl StoredEntry {
    /// First write of a record under a caller-supplied key.
    ///
    /// The `newRecord` flag is left absent.
    pub fn inserted(record: Record, dirty: bool) -> Self {
        Self {
            dirty,
            record: Some(record),
            deleted: None,
            new_record: None,
        }
    }

    /// Overwrite of an already indexed entry.
    pub fn replaced(record: Record, dirty: bool, new_record: bool) -> Self {
        Self {
            dirty,
            record: Some(record),
            deleted: None,
            new_record: Some(new_record),
        }
    }

    /// A record created locally under a generated temporary key.
    pub fn created(record: Record, dirty: bool) -> Self {
        Self {
            dirty,
            record: Some(record),
            deleted: None,
            new_record: Some(true),
        }
    }

    /// A deletion marker. The previous payload is discarded.
    pub fn tombstone() -> Self {
        Self {
            dirty: true,
            record: None,
            deleted: Some(true),
            new_record: None,
        }
    }

    /// Whether this entry is a tombstone.
    pub fn is_deleted(&self) -> bool {
        self.deleted == Some(true)
    }

    /// Whether this entry was created locally and never reached the server.
    pub fn is_new(&self) -> bool {
        self.new_record == Some(true)
    }

    /// Encode for the key-value medium.
    pub fn to_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from the key-value medium.
    pub fn from_json(raw: &str) -> Result<Self, SyncError> {
        Ok(serde_json::from_str(raw)?)
    }
}
