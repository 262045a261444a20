//! # sync-client
//!
//! Offline-first sync layer for offsync.
//!
//! This is the main library that applications use in front of their remote
//! data store.
//!
//! ## Features
//!
//! - **Uniform API**: `get`/`get_all`/`save`/`delete` work the same online
//!   and offline
//! - **Local Record Store**: prefix-namespaced cache with a key index over
//!   any [`KvMedium`] (in-memory or SQLite)
//! - **Reconciliation**: queued offline mutations are replayed when the
//!   connection comes back, best-effort or acknowledged with retries
//! - **Pure State Machine**: uses sync-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use offsync_client::{ConnectivityFlag, SqliteMedium, SyncLayer};
//! use offsync_types::PrimaryKey;
//!
//! let flag = ConnectivityFlag::online();
//! let layer = SyncLayer::builder(my_remote, SqliteMedium::open(path).await?)
//!     .primary_key(PrimaryKey::field("id"))
//!     .connectivity(flag.clone())
//!     .build()
//!     .await?;
//!
//! // Served locally while offline, queued for reconciliation
//! flag.set(false);
//! layer.handle_connectivity_change(false).await;
//! layer.save(None, record).await?;
//!
//! // Replayed after the settle delay
//! flag.set(true);
//! layer.handle_connectivity_change(true).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod medium;
pub mod reconciler;
pub mod remote;
pub mod store;

pub use client::{Hook, SyncLayer, SyncLayerBuilder};
pub use config::{ConfigError, SyncConfig, DEFAULT_PREFIX, DEFAULT_SETTLE_DELAY_MS};
pub use connectivity::{Connectivity, ConnectivityFlag};
pub use error::{ClientError, RemoteError, Result, StorageError};
pub use medium::{KvMedium, MemoryMedium, SqliteMedium};
pub use reconciler::{cache_records, Reconciler};
pub use remote::{MockRemote, NoRemote, RemoteCall, RemoteStore};
pub use store::{match_params, LocalStore, PostProcess, QueryShaping, RecordFilter, INDEX_TOKEN};

// Core types that appear in this crate's public API
pub use offsync_core::{DeliveryPolicy, ReconcileReport};
