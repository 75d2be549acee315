use std::sync::Arc;

use stockroom_core::{AppResult, UserIdentity};
use stockroom_domain::{HistoryEntry, IgnoredFields, ItemId, Permission};

use crate::{HistoryFilter, HistoryRepository, require_permission};

/// Application service for reading an item's history ledger.
#[derive(Clone)]
pub struct HistoryService {
    repository: Arc<dyn HistoryRepository>,
    ignored_fields: IgnoredFields,
}

impl HistoryService {
    /// Creates a new history service ignoring the housekeeping timestamps in diffs.
    #[must_use]
    pub fn new(repository: Arc<dyn HistoryRepository>) -> Self {
        Self {
            repository,
            ignored_fields: IgnoredFields::default(),
        }
    }

    /// Replaces the fields excluded from computed change sets.
    #[must_use]
    pub fn with_ignored_fields(mut self, ignored_fields: IgnoredFields) -> Self {
        self.ignored_fields = ignored_fields;
        self
    }

    /// Lists an item's ledger entries, newest first.
    ///
    /// With `include_changes`, update entries carry the field-level diff of
    /// their snapshots. Create and delete entries never do.
    pub async fn list_item_history(
        &self,
        actor: &UserIdentity,
        item_id: ItemId,
        filter: HistoryFilter,
        include_changes: bool,
    ) -> AppResult<Vec<HistoryEntry>> {
        require_permission(actor, Permission::HistoryRead)?;

        let entries = self.repository.list_by_item(item_id, &filter).await?;
        if !include_changes {
            return Ok(entries);
        }

        Ok(entries
            .into_iter()
            .map(|entry| entry.with_changes(&self.ignored_fields))
            .collect())
    }
}
