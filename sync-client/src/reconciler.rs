//! Reconciliation: replay queued local mutations, then refresh the cache.
//!
//! One pass walks the dirty tokens in index order through an [`Outbox`].
//! Each entry is planned by [`plan_replay`] and dispatched to the remote
//! store one at a time; no batching, no reordering. The [`DeliveryPolicy`]
//! decides what a failed call does to the local entry.
//!
//! Passes are not mutually exclusive. Two concurrent passes may forward
//! the same entry twice.

use crate::error::{ClientError, RemoteError, Result};
use crate::medium::KvMedium;
use crate::remote::RemoteStore;
use crate::store::{usable_token, LocalStore};
use offsync_core::{plan_replay, DeliveryPolicy, Nack, Outbox, ReconcileReport, ReplayAction};
use offsync_types::{PrimaryKey, Record};
use serde_json::json;

/// One reconciliation pass over a store.
pub struct Reconciler<'a, R: RemoteStore, M: KvMedium> {
    store: &'a LocalStore<M>,
    remote: &'a R,
    primary_key: &'a PrimaryKey,
    policy: DeliveryPolicy,
}

impl<'a, R: RemoteStore, M: KvMedium> Reconciler<'a, R, M> {
    /// Prepare a pass. Fails if the store has no primary key.
    pub fn new(store: &'a LocalStore<M>, remote: &'a R, policy: DeliveryPolicy) -> Result<Self> {
        let primary_key = store.primary_key().ok_or_else(|| {
            ClientError::Configuration("primary key must be configured to reconcile".into())
        })?;
        Ok(Self {
            store,
            remote,
            primary_key,
            policy,
        })
    }

    /// Drain the dirty set, then refresh the cache with a full fetch.
    pub async fn run(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();
        let dirty = self.store.dirty_tokens().await?;
        tracing::info!(pending = dirty.len(), policy = ?self.policy, "reconciliation started");

        let mut outbox = Outbox::new(dirty, self.policy.max_attempts());
        while let Some(token) = outbox.next() {
            let Some(entry) = self.store.entry(&token).await? else {
                // removed since the dirty set was taken
                outbox.ack(&token);
                continue;
            };
            if !entry.dirty {
                outbox.ack(&token);
                continue;
            }

            let Some(action) = plan_replay(&token, &entry, self.primary_key) else {
                tracing::warn!(token = %token, "dirty entry has no payload; discarding");
                self.store.remove_token(&token).await?;
                outbox.ack(&token);
                report.discarded += 1;
                continue;
            };

            match self.dispatch(&action).await {
                Ok(()) => {
                    tracing::debug!(token = %token, action = action.kind(), "replayed");
                    outbox.ack(&token);
                    self.store.remove_token(&token).await?;
                    report.delivered(&action);
                }
                Err(e) => match outbox.nack(&token) {
                    Nack::Retry { attempt, delay } => {
                        tracing::warn!(
                            token = %token,
                            action = action.kind(),
                            attempt,
                            ?delay,
                            "replay failed, retrying: {}",
                            e
                        );
                        tokio::time::sleep(delay).await;
                    }
                    Nack::Exhausted => {
                        report.failed += 1;
                        if self.policy.drops_failed() {
                            tracing::error!(
                                token = %token,
                                action = action.kind(),
                                "replay failed, local change dropped: {}",
                                e
                            );
                            self.store.remove_token(&token).await?;
                        } else {
                            tracing::error!(
                                token = %token,
                                action = action.kind(),
                                "replay failed, keeping entry for next pass: {}",
                                e
                            );
                            report.retained += 1;
                        }
                    }
                },
            }
        }

        match self.remote.fetch_all(&json!({})).await {
            Ok(mut records) => {
                // retained entries keep their local change over the server copy
                let retained = outbox.exhausted();
                if !self.policy.drops_failed() && !retained.is_empty() {
                    records.retain(|record| {
                        self.primary_key
                            .key_of(record)
                            .map_or(true, |key| !retained.contains(&key.token()))
                    });
                }
                cache_records(self.store, self.primary_key, records).await?;
                report.refreshed = true;
            }
            Err(e) => tracing::warn!("cache refresh after reconciliation failed: {}", e),
        }

        tracing::info!(
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            failed = report.failed,
            retained = report.retained,
            refreshed = report.refreshed,
            "reconciliation finished"
        );
        Ok(report)
    }

    async fn dispatch(&self, action: &ReplayAction) -> std::result::Result<(), RemoteError> {
        match action {
            ReplayAction::Create { record } => {
                self.remote.save(None, record.clone()).await.map(|_| ())
            }
            ReplayAction::Update { key, record } => {
                self.remote.save(Some(key), record.clone()).await.map(|_| ())
            }
            ReplayAction::Delete { key } => self.remote.delete(key).await,
        }
    }
}

/// Store `records` as clean cache entries keyed by `primary_key`.
///
/// Records without a usable key (missing, or the reserved index token) are
/// logged and skipped. Returns the number cached.
pub async fn cache_records<M: KvMedium>(
    store: &LocalStore<M>,
    primary_key: &PrimaryKey,
    records: Vec<Record>,
) -> Result<usize> {
    let mut cached = 0;
    for record in records {
        match primary_key.key_of(&record) {
            Some(key) if !key.is_empty() => {
                if let Err(e) = usable_token(&key) {
                    tracing::error!(key = %key, "remote record not cached: {}", e);
                    continue;
                }
                store.save(Some(&key), record, false).await?;
                cached += 1;
            }
            _ => {
                tracing::error!(primary_key = %primary_key, "remote record has no key; not cached");
            }
        }
    }
    Ok(cached)
}
