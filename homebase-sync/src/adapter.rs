//! Entity adapters: the bridge between typed local records and the engine's
//! opaque snapshots.
//!
//! Every store access is moved onto tokio's blocking pool with
//! `spawn_blocking`, so the store runs in its own execution context and the
//! engine only ever sees finished results.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use homebase_model::SyncModel;
use homebase_storage::{RecordStore, StorageResult};
use homebase_types::{EntityKind, RecordId, SyncPayload};
use std::sync::Arc;
use tracing::{debug, warn};

/// Every local record of one kind, as encoded for one sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalSnapshot {
    /// Records that encoded cleanly.
    pub payloads: Vec<SyncPayload>,
    /// Records that exist locally but could not be encoded this time.
    ///
    /// They are neither pushed nor treated as deleted.
    pub failed: Vec<RecordId>,
}

impl LocalSnapshot {
    /// Number of local records, encoded or not.
    pub fn len(&self) -> usize {
        self.payloads.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty() && self.failed.is_empty()
    }
}

impl From<Vec<SyncPayload>> for LocalSnapshot {
    fn from(payloads: Vec<SyncPayload>) -> Self {
        Self {
            payloads,
            failed: Vec::new(),
        }
    }
}

/// Snapshot access to the local records of one entity kind.
#[async_trait]
pub trait EntityAdapter: Send + Sync {
    /// The kind this adapter serves.
    fn kind(&self) -> EntityKind;

    /// Serializes and checksums every local record of this kind.
    ///
    /// Records that fail to encode are logged and reported in
    /// [`LocalSnapshot::failed`].
    async fn fetch_local(&self) -> SyncResult<LocalSnapshot>;

    /// Upserts a remote snapshot, merging field by field into an existing
    /// record. Applying the same payload twice leaves the same result.
    async fn apply_remote(&self, payload: &SyncPayload) -> SyncResult<()>;

    /// Removes the record with this id. No-op if absent.
    async fn delete_local(&self, id: RecordId) -> SyncResult<()>;
}

/// [`EntityAdapter`] for any [`SyncModel`] backed by a [`RecordStore`].
pub struct ModelAdapter<M: SyncModel> {
    store: Arc<dyn RecordStore<M>>,
}

impl<M: SyncModel> ModelAdapter<M> {
    /// Creates an adapter over a record store.
    pub fn new(store: Arc<dyn RecordStore<M>>) -> Self {
        Self { store }
    }

    fn decode(payload: &SyncPayload) -> SyncResult<M> {
        if !payload.verify() {
            return Err(SyncError::codec(
                M::KIND,
                Some(payload.id),
                "checksum does not match snapshot data",
            ));
        }
        let record = M::from_snapshot(&payload.data)
            .map_err(|e| SyncError::codec(M::KIND, Some(payload.id), e))?;
        if record.id() != payload.id {
            return Err(SyncError::codec(
                M::KIND,
                Some(payload.id),
                format!("snapshot carries id {}", record.id()),
            ));
        }
        Ok(record)
    }
}

#[async_trait]
impl<M: SyncModel> EntityAdapter for ModelAdapter<M> {
    fn kind(&self) -> EntityKind {
        M::KIND
    }

    async fn fetch_local(&self) -> SyncResult<LocalSnapshot> {
        let store = Arc::clone(&self.store);
        let records = tokio::task::spawn_blocking(move || store.fetch_all()).await??;

        let mut snapshot = LocalSnapshot {
            payloads: Vec::with_capacity(records.len()),
            failed: Vec::new(),
        };
        for record in &records {
            match record.to_payload() {
                Ok(payload) => snapshot.payloads.push(payload),
                Err(e) => {
                    warn!(
                        "Skipping {} record {} that failed to encode: {}",
                        M::KIND,
                        record.id(),
                        e
                    );
                    snapshot.failed.push(record.id());
                }
            }
        }
        Ok(snapshot)
    }

    async fn apply_remote(&self, payload: &SyncPayload) -> SyncResult<()> {
        let incoming = Self::decode(payload)?;
        let store = Arc::clone(&self.store);
        let id = payload.id;

        let merged = tokio::task::spawn_blocking(move || -> StorageResult<bool> {
            let merged =
                store.mutate_and_save(&id, &mut |existing: &mut M| existing.merge_from(&incoming))?;
            if !merged {
                store.insert(incoming)?;
            }
            Ok(merged)
        })
        .await??;

        debug!(
            "{} {} record {}",
            if merged { "Merged" } else { "Inserted" },
            M::KIND,
            id
        );
        Ok(())
    }

    async fn delete_local(&self, id: RecordId) -> SyncResult<()> {
        let store = Arc::clone(&self.store);
        let removed =
            tokio::task::spawn_blocking(move || store.delete_where(&|record: &M| record.id() == id))
                .await??;
        debug!("Deleted {} local {} record(s) for {}", removed, M::KIND, id);
        Ok(())
    }
}
