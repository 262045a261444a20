//! Mock remote store for testing.
//!
//! Serves canned records and records every call for verification.

use super::RemoteStore;
use crate::error::RemoteError;
use async_trait::async_trait;
use offsync_types::{Record, RecordKey};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One call observed by [`MockRemote`].
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    /// `save(key, record)`.
    Save {
        /// Key passed (None for a create).
        key: Option<RecordKey>,
        /// Record passed.
        record: Record,
    },
    /// `fetch_all(params)`.
    FetchAll {
        /// Query params passed.
        params: Value,
    },
    /// `get(key)`.
    Get {
        /// Key passed.
        key: RecordKey,
    },
    /// `delete(key)`.
    Delete {
        /// Key passed.
        key: RecordKey,
    },
}

/// Mock remote store for testing.
///
/// Clones share state, so a test can keep a handle after giving one to
/// the sync layer.
#[derive(Debug, Clone, Default)]
pub struct MockRemote {
    inner: Arc<Mutex<MockRemoteInner>>,
}

#[derive(Debug, Default)]
struct MockRemoteInner {
    records: Vec<Record>,
    by_key: HashMap<String, Record>,
    calls: Vec<RemoteCall>,
    fail_next: usize,
}

impl MockRemote {
    /// Create a new mock remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records returned by every `fetch_all()`.
    pub fn set_records(&self, records: Vec<Record>) {
        let mut inner = self.inner.lock().unwrap();
        inner.records = records;
    }

    /// Record returned by `get(key)`.
    pub fn respond_to_get(&self, key: &RecordKey, record: Record) {
        let mut inner = self.inner.lock().unwrap();
        inner.by_key.insert(key.token(), record);
    }

    /// Cause the next `n` calls to fail as unreachable.
    pub fn fail_next_calls(&self, n: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next = n;
    }

    /// Every call so far, in order. Failed calls are included.
    pub fn calls(&self) -> Vec<RemoteCall> {
        let inner = self.inner.lock().unwrap();
        inner.calls.clone()
    }

    /// Only the `save` calls.
    pub fn saves(&self) -> Vec<(Option<RecordKey>, Record)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RemoteCall::Save { key, record } => Some((key, record)),
                _ => None,
            })
            .collect()
    }

    /// Only the keys passed to `delete`.
    pub fn deletes(&self) -> Vec<RecordKey> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RemoteCall::Delete { key } => Some(key),
                _ => None,
            })
            .collect()
    }

    /// Clear all state (records, calls, failures).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockRemoteInner::default();
    }

    fn record_call(&self, call: RemoteCall) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call);
        if inner.fail_next > 0 {
            inner.fail_next -= 1;
            return Err(RemoteError::Unreachable("mock failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn save(
        &self,
        key: Option<&RecordKey>,
        record: Record,
    ) -> Result<Option<Record>, RemoteError> {
        self.record_call(RemoteCall::Save {
            key: key.cloned(),
            record: record.clone(),
        })?;
        Ok(Some(record))
    }

    async fn fetch_all(&self, params: &Value) -> Result<Vec<Record>, RemoteError> {
        self.record_call(RemoteCall::FetchAll {
            params: params.clone(),
        })?;
        Ok(self.inner.lock().unwrap().records.clone())
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<Record>, RemoteError> {
        self.record_call(RemoteCall::Get { key: key.clone() })?;
        Ok(self.inner.lock().unwrap().by_key.get(&key.token()).cloned())
    }

    async fn delete(&self, key: &RecordKey) -> Result<(), RemoteError> {
        self.record_call(RemoteCall::Delete { key: key.clone() })
    }
}
