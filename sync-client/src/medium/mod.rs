//! Key-value media backing the local record store.
//!
//! A medium is a flat string-to-string map, the moral equivalent of a
//! browser's local storage. The record store layers prefixing, the key
//! index and entry encoding on top.

mod memory;
mod sqlite;

pub use memory::MemoryMedium;
pub use sqlite::SqliteMedium;

use crate::error::StorageError;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for key-value persistence backends.
#[async_trait]
pub trait KvMedium: Send + Sync {
    /// Read the value under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Every key currently stored, in no particular order.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Check that the medium is usable.
    async fn probe(&self) -> Result<(), StorageError> {
        self.keys().await.map(|_| ())
    }
}

#[async_trait]
impl<T: KvMedium + ?Sized> KvMedium for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key).await
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys().await
    }

    async fn probe(&self) -> Result<(), StorageError> {
        (**self).probe().await
    }
}
