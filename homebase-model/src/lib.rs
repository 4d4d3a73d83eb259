//! Domain models synchronized by Homebase.
//!
//! Defines the contract between domain records and the sync engine:
//! - [`SyncModel`]: identity, entity kind, snapshot encoding and the
//!   field-level merge applied when a remote copy lands on a local one
//! - [`merge_ordered_union`]: the merge rule for ordered list fields
//!   such as tags
//!
//! And one concrete model per [`EntityKind`](homebase_types::EntityKind):
//! inventory ([`Item`], [`Location`]), finances ([`Account`],
//! [`Transaction`]) and habits ([`Habit`], [`HabitLog`]).

mod finance;
mod habits;
mod inventory;
mod model;

pub use finance::{Account, Transaction};
pub use habits::{Cadence, Habit, HabitLog};
pub use inventory::{Item, Location};
pub use model::{SyncModel, merge_ordered_union};
