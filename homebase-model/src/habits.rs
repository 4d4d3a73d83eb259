use crate::model::{SyncModel, merge_ordered_union};
use chrono::{DateTime, Utc};
use homebase_types::{EntityKind, RecordId};
use serde::{Deserialize, Serialize};

/// How often a habit is expected to be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
}

/// A habit the user tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: RecordId,
    pub title: String,
    pub cadence: Cadence,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub archived: bool,
}

impl Habit {
    pub fn new(title: impl Into<String>, cadence: Cadence) -> Self {
        Self {
            id: RecordId::new(),
            title: title.into(),
            cadence,
            tags: Vec::new(),
            archived: false,
        }
    }
}

impl SyncModel for Habit {
    const KIND: EntityKind = EntityKind::Habit;

    fn id(&self) -> RecordId {
        self.id
    }

    fn merge_from(&mut self, incoming: &Self) {
        let tags = merge_ordered_union(&self.tags, &incoming.tags);
        *self = incoming.clone();
        self.tags = tags;
    }
}

/// One completion of a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitLog {
    pub id: RecordId,
    pub habit_id: RecordId,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

impl HabitLog {
    pub fn new(habit_id: RecordId, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(),
            habit_id,
            completed_at,
            note: None,
        }
    }
}

impl SyncModel for HabitLog {
    const KIND: EntityKind = EntityKind::HabitLog;

    fn id(&self) -> RecordId {
        self.id
    }
}
