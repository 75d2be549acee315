//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod history;
mod item;
mod security;
mod snapshot_diff;

pub use history::{HistoryAction, HistoryEntry, HistoryEntryParts};
pub use item::{Item, ItemDraft, ItemId};
pub use security::Permission;
pub use snapshot_diff::{ChangeSet, FieldChange, IgnoredFields, diff_snapshots};
