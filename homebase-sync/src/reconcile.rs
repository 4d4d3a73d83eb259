//! Change detection for the push path and the conflict rule for the pull path.

use crate::adapter::LocalSnapshot;
use crate::metadata::MetadataMap;
use chrono::{DateTime, Utc};
use homebase_types::{RecordId, RecordMetadata, SyncPayload};
use std::collections::HashSet;

/// Local changes of one kind relative to its metadata.
#[derive(Debug, Clone, Default)]
pub struct LocalDiff {
    /// Records that are new or whose checksum differs from the last sync.
    pub dirty: Vec<SyncPayload>,
    /// Ids present in metadata that no longer exist locally.
    pub removed: Vec<RecordId>,
}

impl LocalDiff {
    /// Diffs a full local snapshot against stored metadata.
    ///
    /// Records that failed to encode still count as present, so their
    /// metadata is left alone until they encode again.
    pub fn compute(local: LocalSnapshot, metadata: &MetadataMap) -> Self {
        let present: HashSet<RecordId> = local
            .payloads
            .iter()
            .map(|p| p.id)
            .chain(local.failed.iter().copied())
            .collect();

        let dirty = local
            .payloads
            .into_iter()
            .filter(|payload| {
                metadata
                    .get(&payload.id)
                    .is_none_or(|meta| meta.checksum != payload.checksum)
            })
            .collect();

        let removed = metadata
            .keys()
            .filter(|id| !present.contains(id))
            .copied()
            .collect();

        Self { dirty, removed }
    }

    /// True when nothing needs to be sent.
    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty() && self.removed.is_empty()
    }
}

/// What to do with one changed record pulled from the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDecision {
    /// Hand the payload to the adapter and record new metadata.
    Apply,
    /// Re-delivery of something already applied; drop it.
    AlreadyApplied,
}

/// Last-writer-wins keyed on the remote modification time.
///
/// A delta is dropped only when its checksum matches what we last synced and
/// it is not newer than that sync. Everything else is applied.
pub fn decide(
    existing: Option<&RecordMetadata>,
    checksum: &str,
    modified_at: Option<DateTime<Utc>>,
) -> RemoteDecision {
    match existing {
        Some(meta)
            if meta.checksum == checksum
                && modified_at.is_none_or(|at| at <= meta.last_synced) =>
        {
            RemoteDecision::AlreadyApplied
        }
        _ => RemoteDecision::Apply,
    }
}
