//! Entity kinds, the feature groups that gate them, and the remote
//! namespaces their records live in.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user-facing permission bucket. Several entity kinds may share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureGroup {
    Inventory,
    Finances,
    Habits,
}

impl FeatureGroup {
    /// Every known feature group.
    pub const ALL: [FeatureGroup; 3] = [
        FeatureGroup::Inventory,
        FeatureGroup::Finances,
        FeatureGroup::Habits,
    ];

    /// Stable identifier used as the key in persisted configuration.
    pub const fn id(&self) -> &'static str {
        match self {
            FeatureGroup::Inventory => "inventory",
            FeatureGroup::Finances => "finances",
            FeatureGroup::Habits => "habits",
        }
    }

    /// Entity kinds that belong to this group.
    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        EntityKind::ALL
            .into_iter()
            .filter(move |kind| kind.feature() == *self)
    }
}

impl fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FeatureGroup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|group| group.id() == s)
            .ok_or_else(|| Error::UnknownFeature(s.to_string()))
    }
}

/// One of the fixed domain entity types the engine synchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Item,
    Location,
    Account,
    Transaction,
    Habit,
    HabitLog,
}

impl EntityKind {
    /// Every known entity kind.
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Item,
        EntityKind::Location,
        EntityKind::Account,
        EntityKind::Transaction,
        EntityKind::Habit,
        EntityKind::HabitLog,
    ];

    /// Stable identifier used in persisted state keys and logs.
    pub const fn id(&self) -> &'static str {
        match self {
            EntityKind::Item => "item",
            EntityKind::Location => "location",
            EntityKind::Account => "account",
            EntityKind::Transaction => "transaction",
            EntityKind::Habit => "habit",
            EntityKind::HabitLog => "habit_log",
        }
    }

    /// The feature group that gates this kind.
    pub const fn feature(&self) -> FeatureGroup {
        match self {
            EntityKind::Item | EntityKind::Location => FeatureGroup::Inventory,
            EntityKind::Account | EntityKind::Transaction => FeatureGroup::Finances,
            EntityKind::Habit | EntityKind::HabitLog => FeatureGroup::Habits,
        }
    }

    /// The remote namespace dedicated to this kind's records.
    pub fn namespace(&self) -> NamespaceId {
        let name = match self {
            EntityKind::Item => "inventory.items",
            EntityKind::Location => "inventory.locations",
            EntityKind::Account => "finances.accounts",
            EntityKind::Transaction => "finances.transactions",
            EntityKind::Habit => "habits.habits",
            EntityKind::HabitLog => "habits.logs",
        };
        NamespaceId::new(name)
    }

    /// Looks up the kind owning a namespace.
    pub fn from_namespace(namespace: &NamespaceId) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.namespace() == *namespace)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

/// Identifier of a remote-store partition holding one kind's records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceId(String);

impl NamespaceId {
    /// Wraps a namespace name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the namespace name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
