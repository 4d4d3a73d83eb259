//! In-process remote record store.
//!
//! Keeps one zone per namespace with the current records and an append-only
//! change log. Cursors are big-endian change sequence numbers. Test hooks
//! cover latency, one-shot failures, per-record rejection and writes from
//! another device.

use super::{
    BatchOutcome, FetchRequest, RecordOutcome, RemoteChange, RemoteDelta, RemoteRecord,
    RemoteStore,
};
use crate::cursor::Cursor;
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use homebase_types::{NamespaceId, RecordId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Remote operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    Provision,
    Save,
    Fetch,
}

/// Call and record counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteStats {
    pub provision_calls: usize,
    pub save_calls: usize,
    pub records_saved: usize,
    pub records_deleted: usize,
    pub fetch_calls: usize,
}

#[derive(Debug, Clone)]
enum LogEntry {
    Upsert(RemoteDelta),
    Delete(RecordId),
}

#[derive(Debug, Default)]
struct Zone {
    records: BTreeMap<RecordId, RemoteRecord>,
    log: Vec<(u64, LogEntry)>,
}

#[derive(Debug, Default)]
struct Inner {
    zones: HashMap<NamespaceId, Zone>,
    next_seq: u64,
    fail_next: HashMap<RemoteOp, String>,
    rejected: HashSet<RecordId>,
    stats: RemoteStats,
}

impl Inner {
    fn take_failure(&mut self, op: RemoteOp) -> SyncResult<()> {
        match self.fail_next.remove(&op) {
            Some(message) => Err(SyncError::remote(message)),
            None => Ok(()),
        }
    }

    fn append(&mut self, namespace: &NamespaceId, entry: LogEntry) {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.zones
            .entry(namespace.clone())
            .or_default()
            .log
            .push((seq, entry));
    }
}

/// A [`RemoteStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    inner: Mutex<Inner>,
    latency: Mutex<Option<Duration>>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every operation by `latency`.
    pub fn with_latency(latency: Duration) -> Self {
        let store = Self::default();
        store.set_latency(Some(latency));
        store
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// Makes the next call of `op` fail with a remote error.
    pub fn fail_next(&self, op: RemoteOp, message: impl Into<String>) {
        self.lock().fail_next.insert(op, message.into());
    }

    /// Rejects every save or delete of `id` until [`Self::accept`] is called.
    pub fn reject(&self, id: RecordId) {
        self.lock().rejected.insert(id);
    }

    pub fn accept(&self, id: RecordId) {
        self.lock().rejected.remove(&id);
    }

    pub fn stats(&self) -> RemoteStats {
        self.lock().stats
    }

    pub fn has_namespace(&self, namespace: &NamespaceId) -> bool {
        self.lock().zones.contains_key(namespace)
    }

    /// The stored record, if present.
    pub fn record(&self, namespace: &NamespaceId, id: RecordId) -> Option<RemoteRecord> {
        self.lock()
            .zones
            .get(namespace)
            .and_then(|zone| zone.records.get(&id).cloned())
    }

    /// Ids currently stored in `namespace`.
    pub fn record_ids(&self, namespace: &NamespaceId) -> Vec<RecordId> {
        self.lock()
            .zones
            .get(namespace)
            .map(|zone| zone.records.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Writes a record as another device would.
    pub fn put_remote(&self, namespace: &NamespaceId, record: RemoteRecord) {
        let mut inner = self.lock();
        let delta = RemoteDelta {
            id: record.id,
            data: record.data.clone(),
            checksum: record.checksum.clone(),
            modified_at: Some(record.modified_at),
        };
        inner
            .zones
            .entry(namespace.clone())
            .or_default()
            .records
            .insert(record.id, record);
        inner.append(namespace, LogEntry::Upsert(delta));
    }

    /// Deletes a record as another device would.
    pub fn delete_remote(&self, namespace: &NamespaceId, id: RecordId) {
        let mut inner = self.lock();
        if let Some(zone) = inner.zones.get_mut(namespace) {
            zone.records.remove(&id);
        }
        inner.append(namespace, LogEntry::Delete(id));
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn delay(&self) {
        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn decode_cursor(cursor: Option<&Cursor>) -> SyncResult<u64> {
        let Some(cursor) = cursor else {
            return Ok(0);
        };
        let bytes: [u8; 8] = cursor
            .as_bytes()
            .try_into()
            .map_err(|_| SyncError::remote("malformed change cursor"))?;
        Ok(u64::from_be_bytes(bytes))
    }

    /// Changes in one namespace after `since`, and the cursor to resume from.
    fn changes_since(&self, namespace: &NamespaceId, since: u64) -> SyncResult<Vec<RemoteChange>> {
        let inner = self.lock();
        let zone = inner
            .zones
            .get(namespace)
            .ok_or_else(|| SyncError::remote(format!("unknown namespace {namespace}")))?;

        let mut changes = Vec::new();
        let mut latest = since;
        for (seq, entry) in zone.log.iter().filter(|(seq, _)| *seq > since) {
            latest = *seq;
            changes.push(match entry {
                LogEntry::Upsert(delta) => RemoteChange::Changed {
                    namespace: namespace.clone(),
                    delta: delta.clone(),
                },
                LogEntry::Delete(id) => RemoteChange::Deleted {
                    namespace: namespace.clone(),
                    id: *id,
                },
            });
        }
        changes.push(RemoteChange::CursorAdvanced {
            namespace: namespace.clone(),
            cursor: Cursor::new(latest.to_be_bytes().to_vec()),
        });
        Ok(changes)
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn ensure_namespace(&self, namespace: &NamespaceId) -> SyncResult<()> {
        self.delay().await;
        let mut inner = self.lock();
        inner.stats.provision_calls += 1;
        inner.take_failure(RemoteOp::Provision)?;
        inner.zones.entry(namespace.clone()).or_default();
        Ok(())
    }

    async fn save_and_delete(
        &self,
        namespace: &NamespaceId,
        to_save: Vec<RemoteRecord>,
        to_delete: Vec<RecordId>,
    ) -> SyncResult<BatchOutcome> {
        self.delay().await;
        let mut inner = self.lock();
        inner.stats.save_calls += 1;
        inner.take_failure(RemoteOp::Save)?;
        if !inner.zones.contains_key(namespace) {
            return Err(SyncError::remote(format!("unknown namespace {namespace}")));
        }

        let mut outcome = BatchOutcome::default();
        for record in to_save {
            if inner.rejected.contains(&record.id) {
                outcome
                    .saved
                    .push(RecordOutcome::rejected(record.id, "record rejected by server"));
                continue;
            }
            let id = record.id;
            let delta = RemoteDelta {
                id,
                data: record.data.clone(),
                checksum: record.checksum.clone(),
                modified_at: Some(record.modified_at),
            };
            if let Some(zone) = inner.zones.get_mut(namespace) {
                zone.records.insert(id, record);
            }
            inner.append(namespace, LogEntry::Upsert(delta));
            inner.stats.records_saved += 1;
            outcome.saved.push(RecordOutcome::accepted(id));
        }

        for id in to_delete {
            if inner.rejected.contains(&id) {
                outcome
                    .deleted
                    .push(RecordOutcome::rejected(id, "record rejected by server"));
                continue;
            }
            if let Some(zone) = inner.zones.get_mut(namespace) {
                zone.records.remove(&id);
            }
            inner.append(namespace, LogEntry::Delete(id));
            inner.stats.records_deleted += 1;
            outcome.deleted.push(RecordOutcome::accepted(id));
        }

        debug!(
            "Remote {}: {} saved, {} deleted",
            namespace,
            outcome.saved.len(),
            outcome.deleted.len()
        );
        Ok(outcome)
    }

    async fn fetch_changes(
        &self,
        requests: Vec<FetchRequest>,
        sink: mpsc::Sender<RemoteChange>,
    ) -> SyncResult<()> {
        self.delay().await;
        {
            let mut inner = self.lock();
            inner.stats.fetch_calls += 1;
            inner.take_failure(RemoteOp::Fetch)?;
        }

        for request in requests {
            let since = Self::decode_cursor(request.cursor.as_ref())?;
            let changes = self.changes_since(&request.namespace, since)?;
            for change in changes {
                sink.send(change)
                    .await
                    .map_err(|_| SyncError::ChannelClosed)?;
            }
        }
        Ok(())
    }
}

