//! Local record store.
//!
//! A prefix-namespaced record cache on top of any [`KvMedium`]. Layout:
//!
//! ```text
//! <prefix>_index   → JSON array of live tokens, in insertion order
//! <prefix><token>  → StoredEntry JSON
//! ```
//!
//! The index is the only enumeration source; the raw medium is scanned
//! only by [`LocalStore::clear_all`]. Every operation holds the store lock
//! for its whole duration, so index read-modify-write never interleaves.

use crate::error::{ClientError, Result, StorageError};
use crate::medium::KvMedium;
use offsync_core::temp_key;
use offsync_types::{PrimaryKey, Record, RecordKey, StoredEntry, SyncError, LOCAL_KEY_FIELD};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Suffix of the index key; as a token it would address the index itself.
pub const INDEX_TOKEN: &str = "_index";

/// Predicate deciding whether an offline record matches query `params`.
pub type RecordFilter = Arc<dyn Fn(&Record, &Value) -> bool + Send + Sync>;

/// Transform applied to the whole filtered offline result.
pub type PostProcess = Arc<dyn Fn(Vec<Record>) -> Vec<Record> + Send + Sync>;

/// Optional hooks shaping offline query results.
#[derive(Clone, Default)]
pub struct QueryShaping {
    /// Keep only records for which this returns true.
    pub filter: Option<RecordFilter>,
    /// Applied to the filtered collection.
    pub post_process: Option<PostProcess>,
}

impl fmt::Debug for QueryShaping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryShaping")
            .field("filter", &self.filter.is_some())
            .field("post_process", &self.post_process.is_some())
            .finish()
    }
}

/// Stock filter: every field of an object `params` must equal the
/// record's field. Non-object params match everything.
pub fn match_params(record: &Record, params: &Value) -> bool {
    match params {
        Value::Object(wanted) => wanted
            .iter()
            .all(|(field, value)| record.get(field) == Some(value)),
        _ => true,
    }
}

/// Prefix-namespaced record cache with an explicit key index.
pub struct LocalStore<M: KvMedium> {
    medium: M,
    prefix: String,
    primary_key: Option<PrimaryKey>,
    lock: Mutex<()>,
}

impl<M: KvMedium> LocalStore<M> {
    /// Create a store over `medium` under `prefix`.
    pub fn new(medium: M, prefix: impl Into<String>, primary_key: Option<PrimaryKey>) -> Self {
        Self {
            medium,
            prefix: prefix.into(),
            primary_key,
            lock: Mutex::new(()),
        }
    }

    /// The namespace prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The configured primary key.
    pub fn primary_key(&self) -> Option<&PrimaryKey> {
        self.primary_key.as_ref()
    }

    /// The underlying medium.
    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// Medium key holding the index.
    pub fn index_key(&self) -> String {
        format!("{}{}", self.prefix, INDEX_TOKEN)
    }

    /// Medium key holding the entry for `token`.
    pub fn entry_key(&self, token: &str) -> String {
        format!("{}{}", self.prefix, token)
    }

    /// Live tokens in index order.
    pub async fn index(&self) -> Result<Vec<String>> {
        let _guard = self.lock().await;
        self.load_index().await
    }

    /// Whether `key` is indexed.
    pub async fn contains(&self, key: &RecordKey) -> Result<bool> {
        let _guard = self.lock().await;
        let token = key.token();
        Ok(self.load_index().await?.contains(&token))
    }

    /// The raw stored entry for `token`.
    pub async fn entry(&self, token: &str) -> Result<Option<StoredEntry>> {
        let _guard = self.lock().await;
        self.load_entry(token).await
    }

    /// Look up a record.
    ///
    /// Tombstones read as absent. A hit carries its token under
    /// [`LOCAL_KEY_FIELD`].
    pub async fn get(&self, key: &RecordKey) -> Result<Option<Record>> {
        require_key(key, "get")?;
        let token = usable_token(key)?;
        let _guard = self.lock().await;

        let entry = match self.load_entry(&token).await? {
            Some(entry) if !entry.is_deleted() => entry,
            _ => return Ok(None),
        };
        Ok(entry.record.map(|mut record| {
            record.insert(LOCAL_KEY_FIELD.to_string(), Value::String(token));
            record
        }))
    }

    /// Write a record.
    ///
    /// With a key, an indexed entry is overwritten in place (keeping its
    /// `newRecord` flag) and an unknown key is inserted. Without a key (or
    /// with an empty one) a temporary key is minted and stamped into the
    /// record under the primary-key field and [`LOCAL_KEY_FIELD`]; for
    /// compound keys only the reference field is stamped.
    ///
    /// Returns the record as stored.
    pub async fn save(
        &self,
        key: Option<&RecordKey>,
        mut record: Record,
        dirty: bool,
    ) -> Result<Record> {
        let token = key
            .filter(|k| !k.is_empty())
            .map(usable_token)
            .transpose()?;
        let _guard = self.lock().await;
        let mut index = self.load_index().await?;

        match token {
            Some(token) => {
                if index.contains(&token) {
                    let was_new = self
                        .load_entry(&token)
                        .await?
                        .map(|entry| entry.is_new())
                        .unwrap_or(false);
                    self.write_entry(&token, &StoredEntry::replaced(record.clone(), dirty, was_new))
                        .await?;
                } else {
                    self.write_entry(&token, &StoredEntry::inserted(record.clone(), dirty))
                        .await?;
                    index.push(token);
                    self.store_index(&index).await?;
                }
            }
            None => {
                let primary_key = self.primary_key.as_ref().ok_or_else(|| {
                    ClientError::Configuration(
                        "primary key must be configured to create records offline".into(),
                    )
                })?;

                let mut token = temp_key();
                while index.contains(&token) {
                    token = temp_key();
                }

                if let PrimaryKey::Field(field) = primary_key {
                    record.insert(field.clone(), Value::String(token.clone()));
                }
                record.insert(LOCAL_KEY_FIELD.to_string(), Value::String(token.clone()));

                self.write_entry(&token, &StoredEntry::created(record.clone(), dirty))
                    .await?;
                index.push(token.clone());
                self.store_index(&index).await?;
                tracing::debug!(token = %token, "created local record");
            }
        }

        Ok(record)
    }

    /// Replace an indexed entry with a tombstone.
    ///
    /// Returns false (and writes nothing) when the key is not indexed.
    pub async fn mark_deleted(&self, key: &RecordKey) -> Result<bool> {
        require_key(key, "mark_deleted")?;
        let token = usable_token(key)?;
        let _guard = self.lock().await;

        if !self.load_index().await?.contains(&token) {
            tracing::debug!(token = %token, "nothing to mark deleted");
            return Ok(false);
        }
        self.write_entry(&token, &StoredEntry::tombstone()).await?;
        Ok(true)
    }

    /// Delete an entry and drop it from the index. Idempotent.
    pub async fn remove(&self, key: &RecordKey) -> Result<()> {
        require_key(key, "remove")?;
        self.remove_token(&usable_token(key)?).await
    }

    /// [`LocalStore::remove`] by raw token.
    pub async fn remove_token(&self, token: &str) -> Result<()> {
        check_token(token)?;
        let _guard = self.lock().await;

        self.medium.remove(&self.entry_key(token)).await?;
        let mut index = self.load_index().await?;
        let before = index.len();
        index.retain(|t| t != token);
        if index.len() != before {
            self.store_index(&index).await?;
        }
        Ok(())
    }

    /// Snapshot of every live record, shaped by `shaping`.
    ///
    /// Tombstones are skipped. Offline-created records missing their
    /// primary-key field get it back from their token. Each record carries
    /// its token under [`LOCAL_KEY_FIELD`].
    pub async fn list_all(&self, params: &Value, shaping: &QueryShaping) -> Result<Vec<Record>> {
        let _guard = self.lock().await;

        let mut records = Vec::new();
        for token in self.load_index().await? {
            let entry = match self.load_entry(&token).await? {
                Some(entry) => entry,
                None => {
                    tracing::warn!(token = %token, "indexed key has no stored entry");
                    continue;
                }
            };
            if entry.is_deleted() {
                continue;
            }
            let is_new = entry.is_new();
            let Some(mut record) = entry.record else {
                continue;
            };

            if is_new {
                if let Some(PrimaryKey::Field(field)) = &self.primary_key {
                    if !record.contains_key(field) {
                        record.insert(field.clone(), Value::String(token.clone()));
                    }
                }
            }
            record.insert(LOCAL_KEY_FIELD.to_string(), Value::String(token));
            records.push(record);
        }

        if let Some(filter) = &shaping.filter {
            records.retain(|record| filter(record, params));
        }
        if let Some(post_process) = &shaping.post_process {
            records = post_process(records);
        }
        Ok(records)
    }

    /// Tokens of every dirty entry (tombstones included), in index order.
    pub async fn dirty_tokens(&self) -> Result<Vec<String>> {
        let _guard = self.lock().await;

        let mut dirty = Vec::new();
        for token in self.load_index().await? {
            if let Some(entry) = self.load_entry(&token).await? {
                if entry.dirty {
                    dirty.push(token);
                }
            }
        }
        Ok(dirty)
    }

    /// Remove every medium key under this prefix, index included.
    ///
    /// Returns the number of keys removed. Irreversible.
    pub async fn clear_all(&self) -> Result<usize> {
        let _guard = self.lock().await;

        let mut removed = 0;
        for key in self.medium.keys().await? {
            if key.starts_with(&self.prefix) {
                self.medium.remove(&key).await?;
                removed += 1;
            }
        }
        tracing::info!(prefix = %self.prefix, removed, "cleared local store");
        Ok(removed)
    }

    async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }

    async fn load_index(&self) -> Result<Vec<String>> {
        let key = self.index_key();
        match self.medium.get(&key).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                StorageError::Corrupt {
                    key,
                    reason: e.to_string(),
                }
                .into()
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn store_index(&self, index: &[String]) -> Result<()> {
        let raw = serde_json::to_string(index).map_err(offsync_types::SyncError::from)?;
        self.medium.set(&self.index_key(), &raw).await?;
        Ok(())
    }

    async fn load_entry(&self, token: &str) -> Result<Option<StoredEntry>> {
        let key = self.entry_key(token);
        match self.medium.get(&key).await? {
            Some(raw) => StoredEntry::from_json(&raw).map(Some).map_err(|e| {
                StorageError::Corrupt {
                    key,
                    reason: e.to_string(),
                }
                .into()
            }),
            None => Ok(None),
        }
    }

    async fn write_entry(&self, token: &str, entry: &StoredEntry) -> Result<()> {
        let raw = entry.to_json()?;
        self.medium.set(&self.entry_key(token), &raw).await?;
        Ok(())
    }
}

impl<M: KvMedium> fmt::Debug for LocalStore<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStore")
            .field("prefix", &self.prefix)
            .field("primary_key", &self.primary_key)
            .finish()
    }
}

fn require_key(key: &RecordKey, operation: &'static str) -> Result<()> {
    if key.is_empty() {
        return Err(ClientError::MissingKey { operation });
    }
    Ok(())
}

/// The storage token of `key`, unless it collides with the index.
pub(crate) fn usable_token(key: &RecordKey) -> Result<String> {
    let token = key.token();
    check_token(&token)?;
    Ok(token)
}

fn check_token(token: &str) -> Result<()> {
    if token == INDEX_TOKEN {
        let reason = format!("'{}' is reserved for the index", token);
        return Err(SyncError::InvalidKey(reason).into());
    }
    Ok(())
}
