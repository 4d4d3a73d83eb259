//! Per-kind remote fetch cursors.

use crate::error::SyncResult;
use homebase_storage::StateStore;
use homebase_types::EntityKind;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Opaque remote token meaning "everything fetched through this point".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(Vec<u8>);

impl Cursor {
    /// Wraps a token returned by the remote store.
    pub fn new(token: impl Into<Vec<u8>>) -> Self {
        Self(token.into())
    }

    /// The raw token bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Stores one cursor blob per entity kind. A missing cursor means
/// "fetch from the beginning".
pub struct CursorStore {
    state: Arc<dyn StateStore>,
}

impl CursorStore {
    pub fn new(state: Arc<dyn StateStore>) -> Self {
        Self { state }
    }

    fn key(kind: EntityKind) -> String {
        format!("cursor/{}", kind.id())
    }

    /// The cursor for `kind`, if any pull has completed.
    pub fn get(&self, kind: EntityKind) -> SyncResult<Option<Cursor>> {
        Ok(self.state.load(&Self::key(kind))?.map(Cursor))
    }

    /// Replaces the cursor for `kind` wholesale.
    pub fn replace(&self, kind: EntityKind, cursor: &Cursor) -> SyncResult<()> {
        self.state.save(&Self::key(kind), cursor.as_bytes())?;
        Ok(())
    }

    /// Forgets the cursor for `kind`.
    pub fn clear(&self, kind: EntityKind) -> SyncResult<()> {
        self.state.remove(&Self::key(kind))?;
        Ok(())
    }
}
