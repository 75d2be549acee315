use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stockroom_core::AppError;

use crate::{ChangeSet, IgnoredFields, ItemId, diff_snapshots};

/// Mutation kind recorded in the item ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    /// The item was inserted.
    Create,
    /// The item was modified in place.
    Update,
    /// The item was removed.
    Delete,
}

impl HistoryAction {
    /// Returns the stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl FromStr for HistoryAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(AppError::Validation(format!(
                "unknown history action '{value}'"
            ))),
        }
    }
}

/// Stored values of one ledger row.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntryParts {
    /// Storage-assigned, monotonically increasing identifier.
    pub id: i64,
    /// Mutated item.
    pub item_id: ItemId,
    /// Mutation kind.
    pub action: HistoryAction,
    /// Actor bound to the mutating transaction, if any.
    pub actor: Option<String>,
    /// Role bound to the mutating transaction, if any.
    pub actor_role: Option<String>,
    /// Storage write time.
    pub changed_at: DateTime<Utc>,
    /// Item state before the mutation.
    pub old_data: Option<Value>,
    /// Item state after the mutation.
    pub new_data: Option<Value>,
}

/// Immutable ledger entry for one item mutation.
///
/// Only the computed change set can be attached after loading; the stored
/// values are read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    parts: HistoryEntryParts,
    changes: Option<ChangeSet>,
}

impl HistoryEntry {
    /// Wraps stored ledger values.
    #[must_use]
    pub fn new(parts: HistoryEntryParts) -> Self {
        Self {
            parts,
            changes: None,
        }
    }

    /// Returns the ledger identifier.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.parts.id
    }

    /// Returns the mutated item.
    #[must_use]
    pub fn item_id(&self) -> ItemId {
        self.parts.item_id
    }

    /// Returns the mutation kind.
    #[must_use]
    pub fn action(&self) -> HistoryAction {
        self.parts.action
    }

    /// Returns the attributed actor.
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        self.parts.actor.as_deref()
    }

    /// Returns the attributed actor role.
    #[must_use]
    pub fn actor_role(&self) -> Option<&str> {
        self.parts.actor_role.as_deref()
    }

    /// Returns the storage write time.
    #[must_use]
    pub fn changed_at(&self) -> DateTime<Utc> {
        self.parts.changed_at
    }

    /// Returns the snapshot before the mutation.
    #[must_use]
    pub fn old_data(&self) -> Option<&Value> {
        self.parts.old_data.as_ref()
    }

    /// Returns the snapshot after the mutation.
    #[must_use]
    pub fn new_data(&self) -> Option<&Value> {
        self.parts.new_data.as_ref()
    }

    /// Returns the computed change set, when one was attached.
    #[must_use]
    pub fn changes(&self) -> Option<&ChangeSet> {
        self.changes.as_ref()
    }

    /// Attaches the field-level diff of the two snapshots.
    ///
    /// Create and delete entries never carry a change set.
    #[must_use]
    pub fn with_changes(mut self, ignored: &IgnoredFields) -> Self {
        self.changes = match self.parts.action {
            HistoryAction::Update => diff_snapshots(
                self.parts.old_data.as_ref(),
                self.parts.new_data.as_ref(),
                ignored,
            ),
            HistoryAction::Create | HistoryAction::Delete => None,
        };
        self
    }
}
