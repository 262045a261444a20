//! Replay planning for reconciliation.
//!
//! Given one dirty stored entry, decide which remote call forwards it. The
//! plan is pure; sync-client executes it and records the outcome in a
//! [`ReconcileReport`].

use offsync_types::{PrimaryKey, Record, RecordKey, StoredEntry, LOCAL_KEY_FIELD};
use serde_json::Value;

/// The remote call that replays one local mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayAction {
    /// Save without a key; the remote store assigns the identity.
    Create {
        /// Payload to send.
        record: Record,
    },
    /// Save over an existing remote record.
    Update {
        /// Remote key (decomposed for compound keys).
        key: RecordKey,
        /// Payload to send.
        record: Record,
    },
    /// Delete the remote record.
    Delete {
        /// Remote key (decomposed for compound keys).
        key: RecordKey,
    },
}

impl ReplayAction {
    /// Short label for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Plan the replay of the entry stored under `token`.
///
/// - tombstone → `Delete` (scalar and compound keys alike)
/// - new record → `Create`; for a scalar key the temporary key is cleared
///   from the key field so the remote store assigns the real one
/// - anything else → `Update` under the decomposed key
///
/// The reserved [`LOCAL_KEY_FIELD`] never leaves the device. Returns `None`
/// for a live entry without a payload, which has nothing to forward.
pub fn plan_replay(
    token: &str,
    entry: &StoredEntry,
    primary_key: &PrimaryKey,
) -> Option<ReplayAction> {
    let key = primary_key.key_from_token(token);

    if entry.is_deleted() {
        return Some(ReplayAction::Delete { key });
    }

    let mut record = entry.record.clone()?;
    record.remove(LOCAL_KEY_FIELD);

    if entry.is_new() {
        if let PrimaryKey::Field(field) = primary_key {
            record.insert(field.clone(), Value::Null);
        }
        return Some(ReplayAction::Create { record });
    }

    Some(ReplayAction::Update { key, record })
}

/// Outcome counts of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// New records forwarded.
    pub created: usize,
    /// Updates forwarded.
    pub updated: usize,
    /// Deletions forwarded.
    pub deleted: usize,
    /// Remote calls that failed (after all attempts).
    pub failed: usize,
    /// Failed entries kept dirty for the next pass.
    pub retained: usize,
    /// Dirty entries with nothing to forward, dropped locally.
    pub discarded: usize,
    /// Whether the closing full fetch refreshed the cache.
    pub refreshed: bool,
}

impl ReconcileReport {
    /// Count a successfully forwarded action.
    pub fn delivered(&mut self, action: &ReplayAction) {
        match action {
            ReplayAction::Create { .. } => self.created += 1,
            ReplayAction::Update { .. } => self.updated += 1,
            ReplayAction::Delete { .. } => self.deleted += 1,
        }
    }

    /// Total actions that reached the remote store.
    pub fn forwarded(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    /// True when every dirty entry was forwarded and the cache refreshed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.retained == 0 && self.refreshed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn new_scalar_record_is_created_without_key() {
        let entry = StoredEntry::created(
            record(json!({"id": "17000000000000042", "_localKey": "17000000000000042", "name": "x"})),
            true,
        );
        let action = plan_replay("17000000000000042", &entry, &PrimaryKey::field("id")).unwrap();

        match action {
            ReplayAction::Create { record } => {
                assert_eq!(record.get("id"), Some(&Value::Null));
                assert_eq!(record.get("name"), Some(&json!("x")));
                assert!(!record.contains_key(LOCAL_KEY_FIELD));
            }
            other => panic!("expected Create, got {:?}", other),
        }
    }

    #[test]
    fn tombstone_is_deleted() {
        let action = plan_replay("7", &StoredEntry::tombstone(), &PrimaryKey::field("id")).unwrap();
        assert_eq!(
            action,
            ReplayAction::Delete {
                key: RecordKey::single("7")
            }
        );
    }

    #[test]
    fn existing_record_is_updated() {
        let entry = StoredEntry::replaced(record(json!({"id": "42", "v": 2})), true, false);
        let action = plan_replay("42", &entry, &PrimaryKey::field("id")).unwrap();
        assert_eq!(
            action,
            ReplayAction::Update {
                key: RecordKey::single("42"),
                record: record(json!({"id": "42", "v": 2})),
            }
        );
    }

    #[test]
    fn compound_update_uses_decomposed_key() {
        let pk = PrimaryKey::compound(["org", "user"]);
        let entry = StoredEntry::inserted(record(json!({"org": "acme", "user": 7})), true);
        let action = plan_replay("acme,7", &entry, &pk).unwrap();
        assert!(matches!(
            action,
            ReplayAction::Update { ref key, .. } if *key == RecordKey::compound(["acme", "7"])
        ));
        assert_eq!(action.kind(), "update");
    }

    #[test]
    fn compound_tombstone_is_deleted() {
        let pk = PrimaryKey::compound(["org", "user"]);
        let action = plan_replay("acme,7", &StoredEntry::tombstone(), &pk).unwrap();
        assert_eq!(
            action,
            ReplayAction::Delete {
                key: RecordKey::compound(["acme", "7"])
            }
        );
    }

    #[test]
    fn compound_new_record_keeps_key_fields() {
        let pk = PrimaryKey::compound(["org", "user"]);
        let entry = StoredEntry::created(
            record(json!({"org": "acme", "user": 9, "_localKey": "170000"})),
            true,
        );
        let action = plan_replay("170000", &entry, &pk).unwrap();
        assert_eq!(
            action,
            ReplayAction::Create {
                record: record(json!({"org": "acme", "user": 9}))
            }
        );
    }

    #[test]
    fn live_entry_without_payload_has_nothing_to_forward() {
        let entry = StoredEntry {
            dirty: true,
            record: None,
            deleted: None,
            new_record: None,
        };
        assert!(plan_replay("1", &entry, &PrimaryKey::field("id")).is_none());
    }

    #[test]
    fn report_counts() {
        let mut report = ReconcileReport::default();
        report.delivered(&ReplayAction::Create { record: Record::new() });
        report.delivered(&ReplayAction::Delete { key: "1".into() });
        report.refreshed = true;

        assert_eq!(report.created, 1);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.forwarded(), 2);
        assert!(report.is_clean());

        report.retained = 1;
        assert!(!report.is_clean());
    }
}
