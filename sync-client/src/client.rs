//! SyncLayer - the main interface for offsync.
//!
//! This module provides [`SyncLayer`], the read/write surface applications
//! use instead of calling their remote store directly.
//!
//! # Architecture
//!
//! Every call asks the connectivity provider which way to go. Online calls
//! are delegated to the [`RemoteStore`]; offline calls are served by the
//! [`LocalStore`] and queued as dirty entries. Connectivity edges run
//! through a pure state machine (from sync-core) and schedule
//! reconciliation.
//!
//! ```text
//!                  ┌→ RemoteStore (online)
//! Application → SyncLayer
//!                  └→ LocalStore → KvMedium (offline)
//!                        ↑
//!                   Reconciler (offline → online)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use offsync_client::{MemoryMedium, MockRemote, SyncLayer};
//! use offsync_types::PrimaryKey;
//!
//! let layer = SyncLayer::builder(MockRemote::new(), MemoryMedium::new())
//!     .primary_key(PrimaryKey::field("id"))
//!     .build()
//!     .await?;
//!
//! layer.save(None, record).await?;
//! let records = layer.get_all(&json!({})).await?;
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use offsync_core::{DeliveryPolicy, LinkAction, LinkEvent, LinkState, ReconcileReport};
use offsync_types::{PrimaryKey, Record, RecordKey, LOCAL_KEY_FIELD};
use serde_json::Value;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::SyncConfig;
use crate::connectivity::{Connectivity, ConnectivityFlag};
use crate::error::{ClientError, Result};
use crate::medium::KvMedium;
use crate::reconciler::{cache_records, Reconciler};
use crate::remote::RemoteStore;
use crate::store::{LocalStore, QueryShaping};

/// Lifecycle hook run on a connectivity edge.
pub type Hook = Arc<dyn Fn() + Send + Sync>;

const OVERRIDE_NONE: u8 = 0;
const OVERRIDE_ONLINE: u8 = 1;
const OVERRIDE_OFFLINE: u8 = 2;

/// The offline-first sync layer.
///
/// Cheap to clone; clones share the store, the remote and the
/// connectivity state.
pub struct SyncLayer<R: RemoteStore, M: KvMedium> {
    inner: Arc<Inner<R, M>>,
}

struct Inner<R: RemoteStore, M: KvMedium> {
    config: SyncConfig,
    remote: R,
    store: LocalStore<M>,
    connectivity: Arc<dyn Connectivity>,
    override_mode: AtomicU8,
    link: Mutex<LinkState>,
    shaping: QueryShaping,
    on_go_offline: Option<Hook>,
    on_go_online: Option<Hook>,
    auto_reconcile: bool,
}

impl<R: RemoteStore, M: KvMedium> Clone for SyncLayer<R, M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RemoteStore, M: KvMedium> fmt::Debug for SyncLayer<R, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncLayer")
            .field("config", &self.inner.config)
            .field("online", &self.is_online())
            .field("shaping", &self.inner.shaping)
            .finish()
    }
}

impl<R: RemoteStore, M: KvMedium> SyncLayer<R, M> {
    /// Start building a layer over `remote` and `medium`.
    pub fn builder(remote: R, medium: M) -> SyncLayerBuilder<R, M> {
        SyncLayerBuilder::new(remote, medium)
    }

    /// The active configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// The local record store.
    pub fn store(&self) -> &LocalStore<M> {
        &self.inner.store
    }

    /// The remote collaborator.
    pub fn remote(&self) -> &R {
        &self.inner.remote
    }

    /// Effective connectivity: the override if set, else the provider.
    pub fn is_online(&self) -> bool {
        match self.inner.override_mode.load(Ordering::SeqCst) {
            OVERRIDE_ONLINE => true,
            OVERRIDE_OFFLINE => false,
            _ => self.inner.connectivity.is_online(),
        }
    }

    /// Force the connectivity answer. `None` restores the provider.
    ///
    /// Returns the effective state afterwards. Forcing does not count as a
    /// connectivity edge; feed edges through
    /// [`SyncLayer::handle_connectivity_change`].
    pub fn set_connectivity_override(&self, mode: Option<bool>) -> bool {
        let raw = match mode {
            None => OVERRIDE_NONE,
            Some(true) => OVERRIDE_ONLINE,
            Some(false) => OVERRIDE_OFFLINE,
        };
        self.inner.override_mode.store(raw, Ordering::SeqCst);
        tracing::debug!(?mode, "connectivity override set");
        self.is_online()
    }

    /// Fetch one record.
    ///
    /// Online: the remote `get`. Offline: the local store.
    pub async fn get(&self, key: &RecordKey) -> Result<Option<Record>> {
        require_key(key, "get")?;
        if self.is_online() {
            Ok(self.inner.remote.get(key).await?)
        } else {
            self.inner.store.get(key).await
        }
    }

    /// Fetch every record matching `params`, caching online results.
    pub async fn get_all(&self, params: &Value) -> Result<Vec<Record>> {
        self.get_all_with(params, true).await
    }

    /// Fetch every record matching `params`.
    ///
    /// Online: the remote `fetch_all`; with `cache_results` each returned
    /// record is stored as a clean local entry, which needs a primary key.
    /// Offline: the local store, shaped by the configured filter and
    /// post-process hooks.
    pub async fn get_all_with(&self, params: &Value, cache_results: bool) -> Result<Vec<Record>> {
        if !self.is_online() {
            return self.inner.store.list_all(params, &self.inner.shaping).await;
        }

        let primary_key = match (cache_results, self.primary_key()) {
            (true, None) => {
                return Err(ClientError::Configuration(
                    "primary key must be configured to cache results".into(),
                ))
            }
            (true, Some(pk)) => Some(pk),
            (false, _) => None,
        };

        let records = self.inner.remote.fetch_all(params).await.map_err(|e| {
            tracing::warn!("remote fetch_all failed: {}", e);
            e
        })?;

        if let Some(pk) = primary_key {
            let cached = cache_records(&self.inner.store, pk, records.clone()).await?;
            tracing::debug!(fetched = records.len(), cached, "cached remote records");
        }
        Ok(records)
    }

    /// Create (`key == None`) or update a record.
    ///
    /// Online: the remote `save` without the [`LOCAL_KEY_FIELD`] reference,
    /// returning whatever it returns. Offline: a dirty local write,
    /// returning the stored record (with its temporary key when one was
    /// minted).
    pub async fn save(
        &self,
        key: Option<&RecordKey>,
        mut record: Record,
    ) -> Result<Option<Record>> {
        if self.is_online() {
            record.remove(LOCAL_KEY_FIELD);
            Ok(self.inner.remote.save(key, record).await?)
        } else {
            let stored = self.inner.store.save(key, record, true).await?;
            Ok(Some(stored))
        }
    }

    /// Delete a record.
    ///
    /// Online: drop the local cache entry, then the remote `delete`.
    /// Offline: tombstone the local entry for the next reconciliation.
    pub async fn delete(&self, key: &RecordKey) -> Result<()> {
        require_key(key, "delete")?;
        if self.is_online() {
            self.inner.store.remove(key).await?;
            self.inner.remote.delete(key).await?;
        } else if !self.inner.store.mark_deleted(key).await? {
            tracing::debug!(key = %key, "delete of uncached record ignored offline");
        }
        Ok(())
    }

    /// Run one reconciliation pass now.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        Reconciler::new(
            &self.inner.store,
            &self.inner.remote,
            self.inner.config.delivery,
        )?
        .run()
        .await
    }

    /// Drop a local entry without telling the remote store.
    pub async fn remove_local(&self, key: &RecordKey) -> Result<()> {
        self.inner.store.remove(key).await
    }

    /// Wipe every local entry under the configured prefix.
    pub async fn clear_local(&self) -> Result<usize> {
        self.inner.store.clear_all().await
    }

    /// Tokens of the entries waiting for reconciliation.
    pub async fn dirty_keys(&self) -> Result<Vec<String>> {
        self.inner.store.dirty_tokens().await
    }

    fn primary_key(&self) -> Option<&PrimaryKey> {
        self.inner.config.primary_key.as_ref()
    }
}

impl<R, M> SyncLayer<R, M>
where
    R: RemoteStore + 'static,
    M: KvMedium + 'static,
{
    /// Feed one connectivity observation.
    ///
    /// Edge-triggered: an `offline → online` edge runs the online hook and
    /// schedules a reconciliation (returned so callers can await it);
    /// an edge to offline runs the offline hook. Repeated observations do
    /// nothing. Edges are not de-duplicated.
    pub async fn handle_connectivity_change(
        &self,
        online: bool,
    ) -> Option<JoinHandle<Result<ReconcileReport>>> {
        let actions = {
            let mut link = self.inner.link.lock().await;
            let (next, actions) = link.on_event(LinkEvent::from_online(online));
            *link = next;
            actions
        };

        let mut scheduled = None;
        for action in actions {
            match action {
                LinkAction::NotifyOffline => {
                    tracing::info!("connectivity lost; writes go to the local store");
                    if let Some(hook) = &self.inner.on_go_offline {
                        hook();
                    }
                }
                LinkAction::NotifyOnline => {
                    tracing::info!("connectivity restored");
                    if let Some(hook) = &self.inner.on_go_online {
                        hook();
                    }
                    if self.inner.auto_reconcile {
                        scheduled = Some(self.schedule_reconcile());
                    }
                }
            }
        }
        scheduled
    }

    /// Reconcile after the configured settle delay, in the background.
    pub fn schedule_reconcile(&self) -> JoinHandle<Result<ReconcileReport>> {
        let layer = self.clone();
        let delay = self.inner.config.settle_delay();
        tracing::debug!(?delay, "reconciliation scheduled");

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let result = layer.reconcile().await;
            if let Err(e) = &result {
                tracing::error!("scheduled reconciliation failed: {}", e);
            }
            result
        })
    }

    /// Feed every change published on `rx` into
    /// [`SyncLayer::handle_connectivity_change`].
    ///
    /// The task ends when the sender is dropped.
    pub fn watch_connectivity(&self, mut rx: watch::Receiver<bool>) -> JoinHandle<()> {
        let layer = self.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                layer.handle_connectivity_change(online).await;
            }
            tracing::debug!("connectivity watch closed");
        })
    }
}

/// Builder for [`SyncLayer`].
pub struct SyncLayerBuilder<R: RemoteStore, M: KvMedium> {
    remote: R,
    medium: M,
    config: SyncConfig,
    connectivity: Option<Arc<dyn Connectivity>>,
    shaping: QueryShaping,
    on_go_offline: Option<Hook>,
    on_go_online: Option<Hook>,
    auto_reconcile: bool,
}

impl<R: RemoteStore, M: KvMedium> SyncLayerBuilder<R, M> {
    fn new(remote: R, medium: M) -> Self {
        Self {
            remote,
            medium,
            config: SyncConfig::default(),
            connectivity: None,
            shaping: QueryShaping::default(),
            on_go_offline: None,
            on_go_online: None,
            auto_reconcile: true,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the primary key.
    pub fn primary_key(mut self, primary_key: PrimaryKey) -> Self {
        self.config.primary_key = Some(primary_key);
        self
    }

    /// Set the namespace prefix.
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.config.prefix = prefix.to_string();
        self
    }

    /// Set the wait between coming back online and reconciling.
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config = self.config.with_settle_delay(delay);
        self
    }

    /// Set the delivery policy for reconciliation.
    pub fn delivery(mut self, delivery: DeliveryPolicy) -> Self {
        self.config.delivery = delivery;
        self
    }

    /// Set the connectivity provider. Defaults to always online.
    pub fn connectivity(mut self, connectivity: impl Connectivity + 'static) -> Self {
        self.connectivity = Some(Arc::new(connectivity));
        self
    }

    /// Filter applied to offline `get_all` results.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Record, &Value) -> bool + Send + Sync + 'static,
    {
        self.shaping.filter = Some(Arc::new(filter));
        self
    }

    /// Transform applied to the filtered offline `get_all` results.
    pub fn post_process<F>(mut self, post_process: F) -> Self
    where
        F: Fn(Vec<Record>) -> Vec<Record> + Send + Sync + 'static,
    {
        self.shaping.post_process = Some(Arc::new(post_process));
        self
    }

    /// Hook run on every edge to offline.
    pub fn on_go_offline<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_go_offline = Some(Arc::new(hook));
        self
    }

    /// Hook run on every offline → online edge.
    pub fn on_go_online<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_go_online = Some(Arc::new(hook));
        self
    }

    /// Whether an online edge schedules reconciliation (default true).
    pub fn auto_reconcile(mut self, enabled: bool) -> Self {
        self.auto_reconcile = enabled;
        self
    }

    /// Validate the configuration, probe the medium and build the layer.
    ///
    /// # Errors
    ///
    /// [`ClientError::Configuration`] for an invalid configuration,
    /// [`ClientError::StorageUnavailable`] if the medium cannot be used.
    pub async fn build(self) -> Result<SyncLayer<R, M>> {
        self.config
            .validate()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;
        self.medium
            .probe()
            .await
            .map_err(|e| ClientError::StorageUnavailable(e.to_string()))?;

        let connectivity = self
            .connectivity
            .unwrap_or_else(|| Arc::new(ConnectivityFlag::online()));
        let link = LinkState::observed(connectivity.is_online());
        let store = LocalStore::new(
            self.medium,
            self.config.prefix.clone(),
            self.config.primary_key.clone(),
        );

        tracing::debug!(
            prefix = %self.config.prefix,
            online = link.is_online(),
            "sync layer ready"
        );

        Ok(SyncLayer {
            inner: Arc::new(Inner {
                config: self.config,
                remote: self.remote,
                store,
                connectivity,
                override_mode: AtomicU8::new(OVERRIDE_NONE),
                link: Mutex::new(link),
                shaping: self.shaping,
                on_go_offline: self.on_go_offline,
                on_go_online: self.on_go_online,
                auto_reconcile: self.auto_reconcile,
            }),
        })
    }
}

fn require_key(key: &RecordKey, operation: &'static str) -> Result<()> {
    if key.is_empty() {
        return Err(ClientError::MissingKey { operation });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::MemoryMedium;
    use crate::remote::{MockRemote, RemoteCall};
    use crate::store::match_params;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    async fn layer_with(
        remote: MockRemote,
        flag: ConnectivityFlag,
    ) -> SyncLayer<MockRemote, MemoryMedium> {
        SyncLayer::builder(remote, MemoryMedium::new())
            .primary_key(PrimaryKey::field("id"))
            .connectivity(flag)
            .build()
            .await
            .unwrap()
    }

    // ===========================================
    // Construction Tests
    // ===========================================

    #[tokio::test]
    async fn build_fails_when_medium_unavailable() {
        let medium = MemoryMedium::new();
        medium.set_available(false);

        let err = SyncLayer::builder(MockRemote::new(), medium)
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn build_rejects_invalid_config() {
        let err = SyncLayer::builder(MockRemote::new(), MemoryMedium::new())
            .prefix("")
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[tokio::test]
    async fn builder_applies_settings() {
        let layer = SyncLayer::builder(MockRemote::new(), MemoryMedium::new())
            .primary_key(PrimaryKey::compound(["a", "b"]))
            .prefix("app_")
            .settle_delay(Duration::from_millis(50))
            .delivery(DeliveryPolicy::acknowledged(5))
            .build()
            .await
            .unwrap();

        assert_eq!(layer.config().prefix, "app_");
        assert_eq!(layer.config().sync_settle_delay_ms, 50);
        assert_eq!(layer.config().delivery, DeliveryPolicy::acknowledged(5));
        assert_eq!(layer.store().prefix(), "app_");
        assert!(layer.is_online());
    }

    // ===========================================
    // Connectivity Override Tests
    // ===========================================

    #[tokio::test]
    async fn override_wins_over_provider() {
        let flag = ConnectivityFlag::online();
        let layer = layer_with(MockRemote::new(), flag.clone()).await;

        assert!(!layer.set_connectivity_override(Some(false)));
        assert!(!layer.is_online());
        assert!(layer.set_connectivity_override(Some(true)));

        flag.set(false);
        assert!(layer.is_online());
        assert!(!layer.set_connectivity_override(None));
    }

    // ===========================================
    // Online Dispatch Tests
    // ===========================================

    #[tokio::test]
    async fn online_calls_go_to_remote_only() {
        let remote = MockRemote::new();
        let layer = layer_with(remote.clone(), ConnectivityFlag::offline()).await;
        layer.set_connectivity_override(Some(true));

        let saved = layer
            .save(Some(&"1".into()), record(json!({"id": "1"})))
            .await
            .unwrap();
        assert_eq!(saved, Some(record(json!({"id": "1"}))));

        remote.respond_to_get(&"1".into(), record(json!({"id": "1", "v": 9})));
        let got = layer.get(&"1".into()).await.unwrap().unwrap();
        assert_eq!(got.get("v"), Some(&json!(9)));

        layer.delete(&"1".into()).await.unwrap();
        layer.get_all_with(&json!({}), false).await.unwrap();

        assert_eq!(remote.calls().len(), 4);
        assert!(layer.store().medium().is_empty());
    }

    #[tokio::test]
    async fn online_save_strips_local_reference() {
        let remote = MockRemote::new();
        let layer = layer_with(remote.clone(), ConnectivityFlag::online()).await;

        layer
            .save(
                Some(&"1".into()),
                record(json!({"id": "1", (LOCAL_KEY_FIELD): "1"})),
            )
            .await
            .unwrap();
        assert_eq!(remote.saves()[0].1, record(json!({"id": "1"})));
    }

    #[tokio::test]
    async fn online_get_all_caches_clean_records() {
        let remote = MockRemote::new();
        remote.set_records(vec![record(json!({"id": 1})), record(json!({"id": 2}))]);
        let layer = layer_with(remote.clone(), ConnectivityFlag::online()).await;

        let records = layer.get_all(&json!({})).await.unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(layer.store().index().await.unwrap(), vec!["1", "2"]);
        assert!(layer.dirty_keys().await.unwrap().is_empty());
        assert_eq!(
            remote.calls(),
            vec![RemoteCall::FetchAll { params: json!({}) }]
        );
    }

    #[tokio::test]
    async fn caching_get_all_without_primary_key_fails_before_remote_call() {
        let remote = MockRemote::new();
        let layer = SyncLayer::builder(remote.clone(), MemoryMedium::new())
            .build()
            .await
            .unwrap();

        let err = layer.get_all(&json!({})).await.unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
        assert!(remote.calls().is_empty());

        assert!(layer.get_all_with(&json!({}), false).await.is_ok());
    }

    #[tokio::test]
    async fn online_delete_drops_cache_entry() {
        let remote = MockRemote::new();
        remote.set_records(vec![record(json!({"id": "5"}))]);
        let layer = layer_with(remote.clone(), ConnectivityFlag::online()).await;
        layer.get_all(&json!({})).await.unwrap();
        assert!(layer.store().contains(&"5".into()).await.unwrap());

        layer.delete(&"5".into()).await.unwrap();
        assert!(!layer.store().contains(&"5".into()).await.unwrap());
        assert_eq!(remote.deletes(), vec![RecordKey::from("5")]);
    }

    #[tokio::test]
    async fn remote_errors_surface() {
        let remote = MockRemote::new();
        remote.fail_next_calls(1);
        let layer = layer_with(remote, ConnectivityFlag::online()).await;

        let err = layer.get_all(&json!({})).await.unwrap_err();
        assert!(matches!(err, ClientError::Remote(_)));
    }

    #[tokio::test]
    async fn key_operations_need_a_key() {
        let layer = layer_with(MockRemote::new(), ConnectivityFlag::online()).await;
        assert!(matches!(
            layer.get(&RecordKey::single("")).await,
            Err(ClientError::MissingKey { operation: "get" })
        ));
        assert!(matches!(
            layer.delete(&RecordKey::single("")).await,
            Err(ClientError::MissingKey { operation: "delete" })
        ));
    }

    // ===========================================
    // Offline Dispatch Tests
    // ===========================================

    #[tokio::test]
    async fn offline_calls_never_touch_remote() {
        let remote = MockRemote::new();
        let layer = layer_with(remote.clone(), ConnectivityFlag::offline()).await;

        let saved = layer
            .save(None, record(json!({"name": "x"})))
            .await
            .unwrap()
            .unwrap();
        let token = saved["id"].as_str().unwrap().to_string();
        assert!(!token.is_empty());

        let listed = layer.get_all(&json!({})).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].get("name"), Some(&json!("x")));

        let got = layer.get(&token.as_str().into()).await.unwrap().unwrap();
        assert_eq!(got.get(LOCAL_KEY_FIELD), Some(&json!(token)));

        layer.delete(&token.as_str().into()).await.unwrap();
        assert!(layer.get_all(&json!({})).await.unwrap().is_empty());

        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn offline_get_all_uses_shaping_hooks() {
        let layer = SyncLayer::builder(MockRemote::new(), MemoryMedium::new())
            .primary_key(PrimaryKey::field("id"))
            .connectivity(ConnectivityFlag::offline())
            .filter(match_params)
            .post_process(|mut records| {
                records.sort_by(|a, b| b["id"].as_str().cmp(&a["id"].as_str()));
                records
            })
            .build()
            .await
            .unwrap();

        for (id, kind) in [("1", "a"), ("2", "b"), ("3", "a")] {
            layer
                .save(Some(&id.into()), record(json!({"id": id, "kind": kind})))
                .await
                .unwrap();
        }

        let listed = layer.get_all(&json!({"kind": "a"})).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }

    #[tokio::test]
    async fn offline_edits_then_reconcile_empties_dirty_set() {
        let remote = MockRemote::new();
        let layer = layer_with(remote.clone(), ConnectivityFlag::offline()).await;

        layer.save(None, record(json!({"n": 1}))).await.unwrap();
        layer
            .save(Some(&"9".into()), record(json!({"id": "9"})))
            .await
            .unwrap();
        layer.delete(&"9".into()).await.unwrap();
        assert_eq!(layer.dirty_keys().await.unwrap().len(), 2);

        let report = layer.reconcile().await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.deleted, 1);
        assert!(layer.dirty_keys().await.unwrap().is_empty());
        assert!(!layer.store().contains(&"9".into()).await.unwrap());
    }

    #[tokio::test]
    async fn local_maintenance() {
        let layer = layer_with(MockRemote::new(), ConnectivityFlag::offline()).await;
        layer
            .save(Some(&"1".into()), record(json!({"id": "1"})))
            .await
            .unwrap();
        layer
            .save(Some(&"2".into()), record(json!({"id": "2"})))
            .await
            .unwrap();

        layer.remove_local(&"1".into()).await.unwrap();
        assert_eq!(layer.dirty_keys().await.unwrap(), vec!["2"]);

        assert_eq!(layer.clear_local().await.unwrap(), 2);
        assert!(layer.store().medium().is_empty());
    }

    // ===========================================
    // Connectivity Transition Tests
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn coming_online_reconciles_after_settle_delay() {
        let remote = MockRemote::new();
        let flag = ConnectivityFlag::offline();
        let layer = layer_with(remote.clone(), flag.clone()).await;

        layer.save(None, record(json!({"name": "x"}))).await.unwrap();

        flag.set(true);
        let handle = layer
            .handle_connectivity_change(true)
            .await
            .expect("reconciliation scheduled");
        assert!(remote.calls().is_empty());

        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.created, 1);
        assert!(layer.dirty_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn hooks_fire_on_edges_only() {
        let offline = Arc::new(AtomicUsize::new(0));
        let online = Arc::new(AtomicUsize::new(0));
        let (off, on) = (offline.clone(), online.clone());

        let layer = SyncLayer::builder(MockRemote::new(), MemoryMedium::new())
            .primary_key(PrimaryKey::field("id"))
            .connectivity(ConnectivityFlag::online())
            .auto_reconcile(false)
            .on_go_offline(move || {
                off.fetch_add(1, Ordering::SeqCst);
            })
            .on_go_online(move || {
                on.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .await
            .unwrap();

        assert!(layer.handle_connectivity_change(true).await.is_none());
        assert!(layer.handle_connectivity_change(false).await.is_none());
        assert!(layer.handle_connectivity_change(false).await.is_none());
        assert!(layer.handle_connectivity_change(true).await.is_none());

        assert_eq!(offline.load(Ordering::SeqCst), 1);
        assert_eq!(online.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn watch_feeds_transitions() {
        let remote = MockRemote::new();
        let (tx, rx) = watch::channel(false);
        let layer = SyncLayer::builder(remote.clone(), MemoryMedium::new())
            .primary_key(PrimaryKey::field("id"))
            .connectivity(rx.clone())
            .settle_delay(Duration::from_millis(10))
            .build()
            .await
            .unwrap();
        let watcher = layer.watch_connectivity(rx);

        layer
            .save(Some(&"1".into()), record(json!({"id": "1"})))
            .await
            .unwrap();
        tx.send(true).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(remote.saves().len(), 1);
        assert!(layer.dirty_keys().await.unwrap().is_empty());

        drop(tx);
        watcher.await.unwrap();
    }
}
