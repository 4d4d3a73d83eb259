//! Sync engine: runs push/pull cycles and owns every piece of sync state.
//!
//! Engine-owned state is serialized behind two async locks. The config lock
//! covers the user configuration and every status transition. The ledger
//! lock covers metadata, cursors and provisioned namespaces, and is held for
//! the whole of a cycle. Remote changes arrive through a bounded channel and
//! are applied by the engine in arrival order.

use crate::adapter::EntityAdapter;
use crate::broadcast::{Broadcaster, Subscription};
use crate::config::{ConfigStore, SyncConfiguration};
use crate::cursor::{Cursor, CursorStore};
use crate::error::{SyncError, SyncResult};
use crate::metadata::{MetadataMap, MetadataStore};
use crate::reconcile::{LocalDiff, RemoteDecision, decide};
use crate::registry::AdapterRegistry;
use crate::remote::{
    BatchOutcome, FetchRequest, RecordOutcome, RemoteChange, RemoteDelta, RemoteRecord,
    RemoteStore,
};
use crate::settings::SyncSettings;
use crate::status::SyncStatus;
use chrono::{DateTime, Utc};
use homebase_storage::StateStore;
use homebase_types::{EntityKind, FeatureGroup, NamespaceId, RecordId, RecordMetadata, SyncPayload};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tracing::{debug, error, info, warn};

const LAST_SYNC_KEY: &str = "last_sync";

/// Counts from one successful cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Entity kinds that took part.
    pub kinds: usize,
    /// Upserts confirmed by the remote store.
    pub pushed: usize,
    /// Deletes confirmed by the remote store.
    pub deleted_remote: usize,
    /// Remote changes applied locally.
    pub applied: usize,
    /// Remote deletions applied locally.
    pub deleted_local: usize,
    /// Remote changes dropped as re-deliveries.
    pub already_applied: usize,
    /// Records rejected by the remote store or failing to decode.
    pub skipped: usize,
}

impl SyncReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            kinds: 0,
            pushed: 0,
            deleted_remote: 0,
            applied: 0,
            deleted_local: 0,
            already_applied: 0,
            skipped: 0,
        }
    }
}

/// Metadata, cursors and provisioned namespaces.
struct Ledger {
    metadata: MetadataStore,
    cursors: CursorStore,
    /// Namespaces already created during this process lifetime.
    provisioned: HashSet<NamespaceId>,
}

/// The bidirectional sync engine.
pub struct SyncEngine {
    /// One adapter per entity kind.
    registry: AdapterRegistry,
    /// `None` runs cycles locally only.
    remote: Option<Arc<dyn RemoteStore>>,
    state: Arc<dyn StateStore>,
    settings: SyncSettings,
    config: AsyncMutex<ConfigStore>,
    ledger: AsyncMutex<Ledger>,
    /// Finish time of the last successful cycle.
    last_sync: Mutex<Option<DateTime<Utc>>>,
    /// Set while a cycle holds the engine.
    in_flight: AtomicBool,
    status: Broadcaster<SyncStatus>,
    configuration: Broadcaster<SyncConfiguration>,
    last_report: Mutex<Option<SyncReport>>,
}

impl SyncEngine {
    /// Creates an engine over the given collaborators.
    ///
    /// Loads persisted configuration (creating defaults on first run) and
    /// the last sync time. The initial status is `Idle(last sync)` when
    /// sync is enabled and `Disabled` otherwise.
    pub fn new(
        registry: AdapterRegistry,
        remote: Option<Arc<dyn RemoteStore>>,
        state: Arc<dyn StateStore>,
        settings: SyncSettings,
    ) -> SyncResult<Self> {
        let config = ConfigStore::load(Arc::clone(&state))?;
        let last_sync = load_last_sync(state.as_ref())?;

        let initial = if config.current().is_enabled() {
            SyncStatus::Idle { last_sync }
        } else {
            SyncStatus::Disabled
        };
        info!(
            "Sync engine ready: {} adapter(s), remote {}, status {}",
            registry.len(),
            if remote.is_some() { "configured" } else { "absent" },
            initial
        );

        Ok(Self {
            configuration: Broadcaster::new(config.current().clone()),
            status: Broadcaster::new(initial),
            ledger: AsyncMutex::new(Ledger {
                metadata: MetadataStore::new(Arc::clone(&state)),
                cursors: CursorStore::new(Arc::clone(&state)),
                provisioned: HashSet::new(),
            }),
            config: AsyncMutex::new(config),
            last_sync: Mutex::new(last_sync),
            in_flight: AtomicBool::new(false),
            last_report: Mutex::new(None),
            registry,
            remote,
            state,
            settings,
        })
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    // ── Observation ──────────────────────────────────────────────

    /// The current status.
    pub fn status(&self) -> SyncStatus {
        self.status.current()
    }

    /// The current configuration.
    pub fn configuration(&self) -> SyncConfiguration {
        self.configuration.current()
    }

    /// Live status: the current value, then every transition.
    pub fn subscribe_status(&self) -> Subscription<SyncStatus> {
        self.status.subscribe()
    }

    /// Live configuration: the current value, then every change.
    pub fn subscribe_configuration(&self) -> Subscription<SyncConfiguration> {
        self.configuration.subscribe()
    }

    /// Finish time of the last successful cycle.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        *self.last_sync.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Report of the last successful cycle.
    pub fn last_report(&self) -> Option<SyncReport> {
        self.last_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// True while a cycle is running.
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Stored metadata for one kind. Waits for a running cycle.
    pub async fn metadata(&self, kind: EntityKind) -> SyncResult<MetadataMap> {
        self.ledger.lock().await.metadata.load(kind)
    }

    /// Stored cursor for one kind. Waits for a running cycle.
    pub async fn cursor(&self, kind: EntityKind) -> SyncResult<Option<Cursor>> {
        self.ledger.lock().await.cursors.get(kind)
    }

    // ── Configuration ────────────────────────────────────────────

    /// Turns sync on or off. Persisted and broadcast immediately.
    pub async fn set_enabled(&self, enabled: bool) -> SyncResult<()> {
        let mut config = self.config.lock().await;
        if !config.set_enabled(enabled)? {
            return Ok(());
        }
        info!("Sync {}", if enabled { "enabled" } else { "disabled" });
        self.configuration.publish(config.current().clone());

        let status = if !enabled {
            SyncStatus::Disabled
        } else if self.is_syncing() {
            SyncStatus::Syncing
        } else {
            SyncStatus::Idle {
                last_sync: self.last_sync(),
            }
        };
        self.status.publish(status);
        Ok(())
    }

    /// Permits or forbids one feature group. Takes effect from the next cycle.
    pub async fn set_feature_enabled(&self, group: FeatureGroup, enabled: bool) -> SyncResult<()> {
        let mut config = self.config.lock().await;
        if config.set_feature_enabled(group, enabled)? {
            info!(
                "Feature {} {} for sync",
                group,
                if enabled { "enabled" } else { "disabled" }
            );
            self.configuration.publish(config.current().clone());
        }
        Ok(())
    }

    /// Forgets every metadata entry and cursor so the next cycle re-pushes
    /// all local records and pulls from the beginning.
    pub async fn reset_sync_state(&self) -> SyncResult<()> {
        let ledger = self.ledger.lock().await;
        for kind in self.registry.kinds() {
            ledger.metadata.clear(kind)?;
            ledger.cursors.clear(kind)?;
        }
        info!("Cleared sync metadata and cursors for {} kind(s)", self.registry.len());
        Ok(())
    }

    // ── Cycle ────────────────────────────────────────────────────

    /// Runs one push/pull cycle.
    ///
    /// Never fails: every outcome is published as a status. Returns at once
    /// when sync is disabled or another cycle is already running.
    pub async fn synchronize(&self) {
        let config = self.config.lock().await.current().clone();
        if !config.is_enabled() {
            debug!("Sync disabled, skipping cycle");
            self.status.publish(SyncStatus::Disabled);
            return;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Sync cycle already in flight, coalescing");
            return;
        }

        let mut guard = CycleGuard {
            engine: self,
            previous: self.last_sync(),
            finished: false,
        };
        self.status.publish(SyncStatus::Syncing);

        let started = Utc::now();
        let result = match self.run_cycle(&config, started).await {
            Ok(report) => self.record_success(report),
            Err(e) => Err(e),
        };

        // Under the config lock so a concurrent toggle sees a settled status.
        let config = self.config.lock().await;
        let status = match &result {
            Ok(report) => {
                info!(
                    "Sync cycle finished: {} pushed, {} deleted remotely, {} applied, {} deleted locally, {} skipped",
                    report.pushed,
                    report.deleted_remote,
                    report.applied,
                    report.deleted_local,
                    report.skipped
                );
                SyncStatus::Idle {
                    last_sync: Some(report.finished_at),
                }
            }
            Err(e) => {
                error!("Sync cycle failed: {}", e);
                SyncStatus::Error {
                    message: e.to_string(),
                    last_sync: guard.previous,
                }
            }
        };
        if config.current().is_enabled() {
            self.status.publish(status);
        } else {
            self.status.publish(SyncStatus::Disabled);
        }
        guard.finish();
    }

    fn record_success(&self, mut report: SyncReport) -> SyncResult<SyncReport> {
        report.finished_at = Utc::now();
        self.state
            .save(LAST_SYNC_KEY, &serde_json::to_vec(&report.finished_at)?)?;
        *self.last_sync.lock().unwrap_or_else(PoisonError::into_inner) = Some(report.finished_at);
        *self.last_report.lock().unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        Ok(report)
    }

    async fn run_cycle(
        &self,
        config: &SyncConfiguration,
        started: DateTime<Utc>,
    ) -> SyncResult<SyncReport> {
        let adapters = self.registry.active(config);
        let mut report = SyncReport::new(started);
        report.kinds = adapters.len();
        info!("Starting sync cycle for {} kind(s)", adapters.len());

        let mut ledger = self.ledger.lock().await;

        if let Some(remote) = &self.remote {
            for adapter in &adapters {
                let namespace = adapter.kind().namespace();
                if ledger.provisioned.contains(&namespace) {
                    continue;
                }
                remote.ensure_namespace(&namespace).await?;
                debug!("Provisioned namespace {}", namespace);
                ledger.provisioned.insert(namespace);
            }
        }

        for adapter in &adapters {
            self.push_kind(adapter.as_ref(), &ledger, &mut report, started)
                .await?;
        }

        if let Some(remote) = &self.remote {
            self.pull(remote.as_ref(), &adapters, &ledger, &mut report)
                .await?;
        }
        Ok(report)
    }

    // ── Push ─────────────────────────────────────────────────────

    /// Sends one kind's local changes in batches.
    ///
    /// Metadata is written after every confirmed batch. Only accepted records
    /// change their entry; rejected ones stay dirty for the next cycle.
    async fn push_kind(
        &self,
        adapter: &dyn EntityAdapter,
        ledger: &Ledger,
        report: &mut SyncReport,
        pushed_at: DateTime<Utc>,
    ) -> SyncResult<()> {
        let kind = adapter.kind();
        let local = adapter.fetch_local().await?;
        report.skipped += local.failed.len();
        let mut metadata = ledger.metadata.load(kind)?;
        let diff = LocalDiff::compute(local, &metadata);
        if diff.is_empty() {
            debug!("No local changes for {}", kind);
            return Ok(());
        }
        debug!(
            "Pushing {}: {} dirty, {} removed",
            kind,
            diff.dirty.len(),
            diff.removed.len()
        );

        let namespace = kind.namespace();
        let batch_size = self.settings.push_batch_size.max(1);
        let mut dirty = diff.dirty.into_iter();
        let mut removed = diff.removed.into_iter();

        loop {
            let saves: Vec<SyncPayload> = dirty.by_ref().take(batch_size).collect();
            let deletes: Vec<RecordId> = removed.by_ref().take(batch_size).collect();
            if saves.is_empty() && deletes.is_empty() {
                break;
            }

            let checksums: HashMap<RecordId, String> = saves
                .iter()
                .map(|payload| (payload.id, payload.checksum.clone()))
                .collect();

            let outcome = match &self.remote {
                Some(remote) => {
                    let records = saves
                        .into_iter()
                        .map(|payload| RemoteRecord::from_payload(payload, kind.feature(), pushed_at))
                        .collect();
                    remote.save_and_delete(&namespace, records, deletes).await?
                }
                None => BatchOutcome {
                    saved: saves
                        .iter()
                        .map(|payload| RecordOutcome::accepted(payload.id))
                        .collect(),
                    deleted: deletes.iter().copied().map(RecordOutcome::accepted).collect(),
                },
            };

            for saved in outcome.saved {
                let Some(checksum) = checksums.get(&saved.id) else {
                    warn!("Remote reported unknown {} record {}", kind, saved.id);
                    continue;
                };
                match saved.error {
                    None => {
                        metadata.insert(saved.id, RecordMetadata::new(checksum.clone(), pushed_at));
                        report.pushed += 1;
                    }
                    Some(message) => {
                        warn!("Remote rejected {} record {}: {}", kind, saved.id, message);
                        report.skipped += 1;
                    }
                }
            }
            for deleted in outcome.deleted {
                match deleted.error {
                    None => {
                        metadata.remove(&deleted.id);
                        report.deleted_remote += 1;
                    }
                    Some(message) => {
                        warn!(
                            "Remote rejected delete of {} record {}: {}",
                            kind, deleted.id, message
                        );
                        report.skipped += 1;
                    }
                }
            }

            ledger.metadata.save(kind, &metadata)?;
        }
        Ok(())
    }

    // ── Pull ─────────────────────────────────────────────────────

    /// Fetches remote changes for every active kind and applies them.
    ///
    /// The remote posts into a bounded channel while this task drains it.
    /// Touched metadata is saved even when the pull fails; cursors are only
    /// replaced once the fetch succeeded and every change was applied.
    async fn pull(
        &self,
        remote: &dyn RemoteStore,
        adapters: &[Arc<dyn EntityAdapter>],
        ledger: &Ledger,
        report: &mut SyncReport,
    ) -> SyncResult<()> {
        let mut session = PullSession::default();
        let mut requests = Vec::with_capacity(adapters.len());
        for adapter in adapters {
            let kind = adapter.kind();
            requests.push(FetchRequest {
                namespace: kind.namespace(),
                cursor: ledger.cursors.get(kind)?,
            });
            session.metadata.insert(kind, ledger.metadata.load(kind)?);
            session.adapters.insert(kind, Arc::clone(adapter));
        }
        if requests.is_empty() {
            return Ok(());
        }

        let (tx, rx) = mpsc::channel(self.settings.pull_channel_capacity.max(1));
        let fetch = remote.fetch_changes(requests, tx);
        let drain = async {
            // Owned here so an early error closes the channel and stops the fetch.
            let mut rx = rx;
            while let Some(change) = rx.recv().await {
                session.apply(change, report).await?;
            }
            Ok::<_, SyncError>(())
        };
        let (fetched, drained) = tokio::join!(fetch, drain);

        let persisted = session.persist(&ledger.metadata);
        drained?;
        fetched?;
        persisted?;

        for (kind, cursor) in &session.cursors {
            ledger.cursors.replace(*kind, cursor)?;
        }
        Ok(())
    }
}

/// Per-cycle pull state.
#[derive(Default)]
struct PullSession {
    adapters: BTreeMap<EntityKind, Arc<dyn EntityAdapter>>,
    metadata: BTreeMap<EntityKind, MetadataMap>,
    /// Kinds whose metadata changed.
    touched: BTreeSet<EntityKind>,
    /// Cursors to commit once the pull succeeds.
    cursors: BTreeMap<EntityKind, Cursor>,
}

impl PullSession {
    fn adapter_for(&self, namespace: &NamespaceId) -> Option<(EntityKind, Arc<dyn EntityAdapter>)> {
        let kind = EntityKind::from_namespace(namespace)?;
        let adapter = self.adapters.get(&kind)?;
        Some((kind, Arc::clone(adapter)))
    }

    async fn apply(&mut self, change: RemoteChange, report: &mut SyncReport) -> SyncResult<()> {
        match change {
            RemoteChange::Changed { namespace, delta } => {
                let Some((kind, adapter)) = self.adapter_for(&namespace) else {
                    warn!("Ignoring change for inactive namespace {}", namespace);
                    return Ok(());
                };
                self.apply_delta(kind, adapter.as_ref(), delta, report).await
            }
            RemoteChange::Deleted { namespace, id } => {
                let Some((kind, adapter)) = self.adapter_for(&namespace) else {
                    warn!("Ignoring deletion for inactive namespace {}", namespace);
                    return Ok(());
                };
                adapter.delete_local(id).await?;
                self.metadata.entry(kind).or_default().remove(&id);
                self.touched.insert(kind);
                report.deleted_local += 1;
                debug!("Applied remote deletion of {} record {}", kind, id);
                Ok(())
            }
            RemoteChange::CursorAdvanced { namespace, cursor } => {
                match EntityKind::from_namespace(&namespace) {
                    Some(kind) if self.adapters.contains_key(&kind) => {
                        self.cursors.insert(kind, cursor);
                    }
                    _ => warn!("Ignoring cursor for inactive namespace {}", namespace),
                }
                Ok(())
            }
        }
    }

    async fn apply_delta(
        &mut self,
        kind: EntityKind,
        adapter: &dyn EntityAdapter,
        delta: RemoteDelta,
        report: &mut SyncReport,
    ) -> SyncResult<()> {
        let existing = self.metadata.get(&kind).and_then(|map| map.get(&delta.id));
        if decide(existing, &delta.checksum, delta.modified_at) == RemoteDecision::AlreadyApplied {
            debug!("Dropping re-delivered {} record {}", kind, delta.id);
            report.already_applied += 1;
            return Ok(());
        }

        match adapter.apply_remote(&delta.payload()).await {
            Ok(()) => {
                let last_synced = delta.modified_at.unwrap_or_else(Utc::now);
                self.metadata
                    .entry(kind)
                    .or_default()
                    .insert(delta.id, RecordMetadata::new(delta.checksum, last_synced));
                self.touched.insert(kind);
                report.applied += 1;
                Ok(())
            }
            Err(e) if e.is_record_scoped() => {
                warn!("Skipping remote {} record {}: {}", kind, delta.id, e);
                report.skipped += 1;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn persist(&self, store: &MetadataStore) -> SyncResult<()> {
        for kind in &self.touched {
            if let Some(map) = self.metadata.get(kind) {
                store.save(*kind, map)?;
            }
        }
        Ok(())
    }
}

/// Holds the in-flight flag for one cycle.
///
/// Dropped without [`CycleGuard::finish`] means the cycle future was
/// cancelled at a suspension point.
struct CycleGuard<'a> {
    engine: &'a SyncEngine,
    previous: Option<DateTime<Utc>>,
    finished: bool,
}

impl CycleGuard<'_> {
    fn finish(&mut self) {
        self.finished = true;
        self.engine.in_flight.store(false, Ordering::Release);
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.engine.in_flight.store(false, Ordering::Release);
        if !self.finished {
            warn!("Sync cycle cancelled");
            self.engine.status.publish(SyncStatus::Error {
                message: "sync cancelled".to_string(),
                last_sync: self.previous,
            });
        }
    }
}

fn load_last_sync(state: &dyn StateStore) -> SyncResult<Option<DateTime<Utc>>> {
    let Some(bytes) = state.load(LAST_SYNC_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_slice(&bytes) {
        Ok(at) => Ok(Some(at)),
        Err(e) => {
            warn!("Discarding unreadable last sync time: {}", e);
            Ok(None)
        }
    }
}
