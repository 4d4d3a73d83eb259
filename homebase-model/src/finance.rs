use crate::model::{SyncModel, merge_ordered_union};
use chrono::NaiveDate;
use homebase_types::{EntityKind, RecordId};
use serde::{Deserialize, Serialize};

/// A money account. Amounts are in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: RecordId,
    pub name: String,
    /// ISO 4217 code.
    pub currency: String,
    pub opening_balance_minor: i64,
    #[serde(default)]
    pub archived: bool,
}

impl Account {
    pub fn new(name: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
            currency: currency.into(),
            opening_balance_minor: 0,
            archived: false,
        }
    }
}

impl SyncModel for Account {
    const KIND: EntityKind = EntityKind::Account;

    fn id(&self) -> RecordId {
        self.id
    }
}

/// A single booked transaction against an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: RecordId,
    pub account_id: RecordId,
    pub amount_minor: i64,
    pub payee: String,
    pub occurred_on: NaiveDate,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Transaction {
    pub fn new(
        account_id: RecordId,
        amount_minor: i64,
        payee: impl Into<String>,
        occurred_on: NaiveDate,
    ) -> Self {
        Self {
            id: RecordId::new(),
            account_id,
            amount_minor,
            payee: payee.into(),
            occurred_on,
            category: None,
            tags: Vec::new(),
        }
    }
}

impl SyncModel for Transaction {
    const KIND: EntityKind = EntityKind::Transaction;

    fn id(&self) -> RecordId {
        self.id
    }

    fn merge_from(&mut self, incoming: &Self) {
        let tags = merge_ordered_union(&self.tags, &incoming.tags);
        *self = incoming.clone();
        self.tags = tags;
    }
}
