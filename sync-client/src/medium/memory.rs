//! In-memory medium for tests and ephemeral caches.

use super::KvMedium;
use crate::error::StorageError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// In-memory key-value medium.
///
/// Clones share the same map, so a test can hand one clone to the layer
/// and inspect the raw contents through another. Not persistent.
#[derive(Debug, Default, Clone)]
pub struct MemoryMedium {
    inner: Arc<Mutex<MemoryMediumInner>>,
}

#[derive(Debug, Default)]
struct MemoryMediumInner {
    values: HashMap<String, String>,
    unavailable: bool,
}

impl MemoryMedium {
    /// Create a new empty medium.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail until switched back on.
    pub fn set_available(&self, available: bool) {
        self.lock().unavailable = !available;
    }

    /// Raw value under `key`, bypassing availability.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    /// Number of raw keys stored.
    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    /// Check if the medium holds nothing.
    pub fn is_empty(&self) -> bool {
        self.lock().values.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryMediumInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn available(&self) -> Result<MutexGuard<'_, MemoryMediumInner>, StorageError> {
        let inner = self.lock();
        if inner.unavailable {
            return Err(StorageError::Unavailable("memory medium switched off".into()));
        }
        Ok(inner)
    }
}

#[async_trait]
impl KvMedium for MemoryMedium {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.available()?.values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.available()?
            .values
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.available()?.values.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.available()?.values.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove() {
        let medium = MemoryMedium::new();
        medium.set("a", "1").await.unwrap();
        assert_eq!(medium.get("a").await.unwrap().as_deref(), Some("1"));

        medium.remove("a").await.unwrap();
        assert!(medium.get("a").await.unwrap().is_none());

        // Removing again is fine
        medium.remove("a").await.unwrap();
    }

    #[tokio::test]
    async fn clones_share_state() {
        let medium = MemoryMedium::new();
        let other = medium.clone();
        medium.set("k", "v").await.unwrap();
        assert_eq!(other.raw("k").as_deref(), Some("v"));
        assert_eq!(other.len(), 1);
    }

    #[tokio::test]
    async fn unavailable_medium_fails_every_operation() {
        let medium = MemoryMedium::new();
        medium.set_available(false);

        assert!(matches!(
            medium.get("x").await,
            Err(StorageError::Unavailable(_))
        ));
        assert!(medium.set("x", "y").await.is_err());
        assert!(medium.probe().await.is_err());

        medium.set_available(true);
        assert!(medium.probe().await.is_ok());
    }

    #[tokio::test]
    async fn keys_lists_everything() {
        let medium = MemoryMedium::new();
        medium.set("p_index", "[]").await.unwrap();
        medium.set("p1", "{}").await.unwrap();
        let mut keys = medium.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["p1".to_string(), "p_index".to_string()]);
    }
}
