//! Per-kind record metadata: record id -> {checksum, lastSynced}.

use crate::error::SyncResult;
use homebase_storage::StateStore;
use homebase_types::{EntityKind, RecordId, RecordMetadata};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// The metadata map for one entity kind.
pub type MetadataMap = BTreeMap<RecordId, RecordMetadata>;

/// Persists one JSON metadata map per entity kind.
///
/// Stored as `{"<record-id>": {"checksum": "...", "lastSynced": "<RFC 3339>"}}`.
pub struct MetadataStore {
    state: Arc<dyn StateStore>,
}

impl MetadataStore {
    pub fn new(state: Arc<dyn StateStore>) -> Self {
        Self { state }
    }

    fn key(kind: EntityKind) -> String {
        format!("metadata/{}", kind.id())
    }

    /// Loads the map for `kind`. Missing or unreadable maps load as empty.
    pub fn load(&self, kind: EntityKind) -> SyncResult<MetadataMap> {
        let Some(bytes) = self.state.load(&Self::key(kind))? else {
            return Ok(MetadataMap::new());
        };
        match serde_json::from_slice(&bytes) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!("Discarding unreadable {} metadata: {}", kind, e);
                Ok(MetadataMap::new())
            }
        }
    }

    /// Replaces the map for `kind`.
    pub fn save(&self, kind: EntityKind, map: &MetadataMap) -> SyncResult<()> {
        self.state.save(&Self::key(kind), &serde_json::to_vec(map)?)?;
        Ok(())
    }

    /// Removes all metadata for `kind`.
    pub fn clear(&self, kind: EntityKind) -> SyncResult<()> {
        self.state.remove(&Self::key(kind))?;
        Ok(())
    }
}
