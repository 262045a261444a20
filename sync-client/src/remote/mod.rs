//! Remote store abstraction.
//!
//! The sync layer never talks to a server directly. Online operations and
//! reconciliation go through a [`RemoteStore`], which an application
//! implements over its own API (HTTP, gRPC, a database driver).
//!
//! # Design
//!
//! Every operation has a default body that logs a warning and returns
//! [`RemoteError::Unconfigured`], so a collaborator only implements what it
//! supports:
//! - `save(None, ..)` creates, `save(Some(key), ..)` updates
//! - `fetch_all(params)` lists records matching opaque query params
//! - `get(key)` fetches one record
//! - `delete(key)` removes one record
//!
//! # Example
//!
//! ```ignore
//! let remote = MockRemote::new();
//! remote.set_records(vec![record]);
//! let records = remote.fetch_all(&json!({})).await?;
//! ```

mod mock;

pub use mock::{MockRemote, RemoteCall};

use crate::error::RemoteError;
use async_trait::async_trait;
use offsync_types::{Record, RecordKey};
use serde_json::Value;
use std::sync::Arc;

/// Trait for the remote side of the sync layer.
///
/// Implementations must be cheap to share; the layer holds one behind an
/// `Arc` and calls it from background reconcile tasks.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create (`key == None`) or update a record.
    ///
    /// May return the stored form of the record.
    async fn save(
        &self,
        key: Option<&RecordKey>,
        record: Record,
    ) -> Result<Option<Record>, RemoteError> {
        let _ = (key, record);
        unconfigured("save")
    }

    /// Fetch every record matching `params`.
    async fn fetch_all(&self, params: &Value) -> Result<Vec<Record>, RemoteError> {
        let _ = params;
        unconfigured("fetch_all")
    }

    /// Fetch one record.
    async fn get(&self, key: &RecordKey) -> Result<Option<Record>, RemoteError> {
        let _ = key;
        unconfigured("get")
    }

    /// Delete one record.
    async fn delete(&self, key: &RecordKey) -> Result<(), RemoteError> {
        let _ = key;
        unconfigured("delete")
    }
}

fn unconfigured<T>(operation: &'static str) -> Result<T, RemoteError> {
    tracing::warn!(operation, "remote operation not configured");
    Err(RemoteError::Unconfigured { operation })
}

#[async_trait]
impl<R: RemoteStore + ?Sized> RemoteStore for Arc<R> {
    async fn save(
        &self,
        key: Option<&RecordKey>,
        record: Record,
    ) -> Result<Option<Record>, RemoteError> {
        (**self).save(key, record).await
    }

    async fn fetch_all(&self, params: &Value) -> Result<Vec<Record>, RemoteError> {
        (**self).fetch_all(params).await
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<Record>, RemoteError> {
        (**self).get(key).await
    }

    async fn delete(&self, key: &RecordKey) -> Result<(), RemoteError> {
        (**self).delete(key).await
    }
}

/// A remote with no operations configured.
///
/// Useful for purely local use: every call fails with
/// [`RemoteError::Unconfigured`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

impl RemoteStore for NoRemote {}
