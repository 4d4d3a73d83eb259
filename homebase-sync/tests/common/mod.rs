//! Shared test helpers for sync tests.

#![allow(dead_code)]

use homebase_model::SyncModel;
use homebase_types::{EntityKind, RecordId};
use serde::ser::{Error as _, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

/// An item-kind record whose encoding can be switched off.
///
/// `unencodable` is never part of the snapshot, so toggling it leaves the
/// checksum of the encoded form unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FragileItem {
    pub id: RecordId,
    pub name: String,
    #[serde(skip)]
    pub unencodable: bool,
}

impl FragileItem {
    pub fn new(name: &str) -> Self {
        Self {
            id: RecordId::new(),
            name: name.to_string(),
            unencodable: false,
        }
    }
}

impl Serialize for FragileItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.unencodable {
            return Err(S::Error::custom("record cannot be encoded"));
        }
        let mut state = serializer.serialize_struct("FragileItem", 2)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.name)?;
        state.end()
    }
}

impl SyncModel for FragileItem {
    const KIND: EntityKind = EntityKind::Item;

    fn id(&self) -> RecordId {
        self.id
    }
}
