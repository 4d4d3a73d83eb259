use homebase_types::{EntityKind, RecordId, SyncPayload};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A domain record the sync engine can snapshot, checksum and merge.
///
/// Snapshots are the record's JSON encoding. Field order follows the
/// struct declaration, so encoding the same logical record twice yields
/// identical bytes and therefore an identical checksum.
pub trait SyncModel: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The entity kind this model is stored under.
    const KIND: EntityKind;

    /// The record's identifier.
    fn id(&self) -> RecordId;

    /// Merges an incoming remote copy into this local record.
    ///
    /// Default: every field is a scalar and is replaced by the incoming
    /// value. Models with ordered list fields override this to union them
    /// with [`merge_ordered_union`]. Must be idempotent.
    fn merge_from(&mut self, incoming: &Self) {
        *self = incoming.clone();
    }

    /// Serializes the record into a checksummed payload.
    fn to_payload(&self) -> homebase_types::Result<SyncPayload> {
        SyncPayload::from_json(self.id(), self)
    }

    /// Decodes a record from snapshot bytes.
    fn from_snapshot(data: &[u8]) -> homebase_types::Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Unions two ordered lists, keeping first-seen order from `existing` then
/// `incoming`, with duplicates removed.
pub fn merge_ordered_union(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + incoming.len());
    for value in existing.iter().chain(incoming) {
        if !merged.contains(value) {
            merged.push(value.clone());
        }
    }
    merged
}
