//! # sync-core
//!
//! Pure logic for offsync (no I/O, instant tests).
//!
//! This crate implements the decisions behind offline-first sync without
//! touching the network or the local medium:
//! - which remote call replays a queued local mutation ([`plan_replay`])
//! - how connectivity edges turn into lifecycle hooks ([`LinkState`])
//! - in what order, and how many times, queued keys are delivered ([`Outbox`])
//! - how temporary keys for offline-created records are minted ([`temp_key`])
//!
//! The actual I/O is performed by `sync-client`, which interprets the
//! actions and plans produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod delivery;
pub mod outbox;
pub mod replay;
pub mod state;
pub mod temp_key;

pub use delivery::{retry_backoff, DeliveryPolicy, DEFAULT_MAX_ATTEMPTS};
pub use outbox::{Nack, Outbox};
pub use replay::{plan_replay, ReconcileReport, ReplayAction};
pub use state::{LinkAction, LinkEvent, LinkState};
pub use temp_key::{temp_key, temp_key_at};
