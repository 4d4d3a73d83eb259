use crate::model::{SyncModel, merge_ordered_union};
use chrono::NaiveDate;
use homebase_types::{EntityKind, RecordId};
use serde::{Deserialize, Serialize};

/// A tracked household item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: RecordId,
    pub name: String,
    pub quantity: i64,
    #[serde(default)]
    pub location_id: Option<RecordId>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub purchased_on: Option<NaiveDate>,
}

impl Item {
    /// Creates an item with a fresh id and no optional fields.
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
            quantity,
            location_id: None,
            tags: Vec::new(),
            notes: None,
            purchased_on: None,
        }
    }
}

impl SyncModel for Item {
    const KIND: EntityKind = EntityKind::Item;

    fn id(&self) -> RecordId {
        self.id
    }

    fn merge_from(&mut self, incoming: &Self) {
        let tags = merge_ordered_union(&self.tags, &incoming.tags);
        *self = incoming.clone();
        self.tags = tags;
    }
}

/// A place items are kept (room, shelf, box).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<RecordId>,
}

impl Location {
    /// Creates a top-level location.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
            parent_id: None,
        }
    }
}

impl SyncModel for Location {
    const KIND: EntityKind = EntityKind::Location;

    fn id(&self) -> RecordId {
        self.id
    }
}
