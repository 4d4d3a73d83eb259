//! Local persistence collaborator for typed domain records.

use crate::error::{StorageError, StorageResult};
use homebase_model::SyncModel;
use homebase_types::RecordId;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Typed repository for one domain model.
///
/// Implementations are synchronous and may block; callers running on an
/// async runtime must move calls onto a blocking worker.
pub trait RecordStore<M: SyncModel>: Send + Sync {
    /// Returns every stored record.
    fn fetch_all(&self) -> StorageResult<Vec<M>>;

    /// Returns the record with this id, if any.
    fn find_by_id(&self, id: &RecordId) -> StorageResult<Option<M>>;

    /// Inserts a record, replacing any record with the same id.
    fn insert(&self, record: M) -> StorageResult<()>;

    /// Deletes every record matching the predicate. Returns how many were removed.
    fn delete_where(&self, predicate: &dyn Fn(&M) -> bool) -> StorageResult<usize>;

    /// Mutates the record with this id and saves it in one step.
    ///
    /// Returns `false` without calling `mutate` when no such record exists.
    fn mutate_and_save(&self, id: &RecordId, mutate: &mut dyn FnMut(&mut M))
    -> StorageResult<bool>;
}

/// In-memory record store.
pub struct MemoryRecordStore<M> {
    records: Mutex<BTreeMap<RecordId, M>>,
}

impl<M: SyncModel> MemoryRecordStore<M> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
        }
    }

    /// Creates a store pre-populated with records.
    pub fn with_records(records: impl IntoIterator<Item = M>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().map(|r| (r.id(), r)).collect()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.lock()?.len())
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, BTreeMap<RecordId, M>>> {
        self.records.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

impl<M: SyncModel> Default for MemoryRecordStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: SyncModel> RecordStore<M> for MemoryRecordStore<M> {
    fn fetch_all(&self) -> StorageResult<Vec<M>> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn find_by_id(&self, id: &RecordId) -> StorageResult<Option<M>> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn insert(&self, record: M) -> StorageResult<()> {
        self.lock()?.insert(record.id(), record);
        Ok(())
    }

    fn delete_where(&self, predicate: &dyn Fn(&M) -> bool) -> StorageResult<usize> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|_, record| !predicate(record));
        Ok(before - records.len())
    }

    fn mutate_and_save(
        &self,
        id: &RecordId,
        mutate: &mut dyn FnMut(&mut M),
    ) -> StorageResult<bool> {
        let mut records = self.lock()?;
        let Some(existing) = records.get(id) else {
            return Ok(false);
        };
        // The stored record is only replaced once `mutate` has returned.
        let mut updated = existing.clone();
        mutate(&mut updated);
        if updated.id() != *id {
            return Err(StorageError::InvalidData(format!(
                "mutation changed record id {id} to {}",
                updated.id()
            )));
        }
        records.insert(*id, updated);
        Ok(true)
    }
}
