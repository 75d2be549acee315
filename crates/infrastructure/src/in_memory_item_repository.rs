use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use stockroom_application::{
    HistoryFilter, HistoryRepository, ItemMutation, ItemRepository, SessionContext,
};
use stockroom_core::{AppError, AppResult};
use stockroom_domain::{HistoryAction, HistoryEntry, HistoryEntryParts, Item, ItemDraft, ItemId};
use tokio::sync::Mutex;

/// In-memory item store with its own history ledger.
///
/// Mirrors the PostgreSQL audit trigger: each mutation and its ledger entry
/// are applied under one lock, so readers never see one without the other.
#[derive(Debug, Default)]
pub struct InMemoryItemRepository {
    state: Mutex<InMemoryState>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    items: BTreeMap<ItemId, Item>,
    history: Vec<HistoryEntry>,
    last_item_id: i64,
    last_history_id: i64,
}

impl InMemoryItemRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl InMemoryState {
    fn ensure_unique_sku(&self, draft: &ItemDraft, except: Option<ItemId>) -> AppResult<()> {
        let sku = draft.sku().as_str();
        let taken = self
            .items
            .values()
            .any(|item| item.sku() == sku && Some(item.id()) != except);

        if taken {
            return Err(AppError::Conflict(format!("sku '{sku}' must be unique")));
        }

        Ok(())
    }

    fn record(
        &mut self,
        context: &SessionContext,
        item_id: ItemId,
        action: HistoryAction,
        old: Option<&Item>,
        new: Option<&Item>,
    ) {
        self.last_history_id += 1;
        self.history.push(HistoryEntry::new(HistoryEntryParts {
            id: self.last_history_id,
            item_id,
            action,
            actor: Some(context.actor().to_owned()),
            actor_role: Some(context.role().as_str().to_owned()),
            changed_at: Utc::now(),
            old_data: old.map(Item::snapshot),
            new_data: new.map(Item::snapshot),
        }));
    }
}

fn matches_search(item: &Item, needle: &str) -> bool {
    let needle = needle.to_lowercase();

    item.sku().to_lowercase().contains(&needle)
        || item.name().to_lowercase().contains(&needle)
        || item
            .location()
            .is_some_and(|location| location.to_lowercase().contains(&needle))
}

/// Same order as the SQL reader: `changed_at DESC, id DESC`.
fn sort_newest_first(entries: &mut [HistoryEntry]) {
    entries.sort_by(|left, right| {
        right
            .changed_at()
            .cmp(&left.changed_at())
            .then_with(|| right.id().cmp(&left.id()))
    });
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn list_items(&self, search: Option<&str>) -> AppResult<Vec<Item>> {
        let state = self.state.lock().await;

        Ok(state
            .items
            .values()
            .filter(|item| search.is_none_or(|needle| matches_search(item, needle)))
            .cloned()
            .collect())
    }

    async fn find_item(&self, item_id: ItemId) -> AppResult<Option<Item>> {
        Ok(self.state.lock().await.items.get(&item_id).cloned())
    }

    async fn apply_mutation(
        &self,
        context: &SessionContext,
        mutation: ItemMutation,
    ) -> AppResult<Item> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        match mutation {
            ItemMutation::Create(draft) => {
                state.ensure_unique_sku(&draft, None)?;

                state.last_item_id += 1;
                let item = Item::new(ItemId::new(state.last_item_id), draft, now, now);
                state.items.insert(item.id(), item.clone());
                state.record(context, item.id(), HistoryAction::Create, None, Some(&item));

                Ok(item)
            }
            ItemMutation::Update { item_id, draft } => {
                let previous = state
                    .items
                    .get(&item_id)
                    .cloned()
                    .ok_or_else(|| AppError::NotFound(format!("item '{item_id}' does not exist")))?;
                state.ensure_unique_sku(&draft, Some(item_id))?;

                let item = Item::new(item_id, draft, previous.created_at(), now);
                state.items.insert(item_id, item.clone());
                state.record(
                    context,
                    item_id,
                    HistoryAction::Update,
                    Some(&previous),
                    Some(&item),
                );

                Ok(item)
            }
            ItemMutation::Delete { item_id } => {
                let removed = state
                    .items
                    .remove(&item_id)
                    .ok_or_else(|| AppError::NotFound(format!("item '{item_id}' does not exist")))?;
                state.record(context, item_id, HistoryAction::Delete, Some(&removed), None);

                Ok(removed)
            }
        }
    }
}

#[async_trait]
impl HistoryRepository for InMemoryItemRepository {
    async fn list_by_item(
        &self,
        item_id: ItemId,
        filter: &HistoryFilter,
    ) -> AppResult<Vec<HistoryEntry>> {
        let state = self.state.lock().await;

        let mut entries: Vec<HistoryEntry> = state
            .history
            .iter()
            .filter(|entry| entry.item_id() == item_id && filter.matches(entry))
            .cloned()
            .collect();
        sort_newest_first(&mut entries);

        Ok(entries)
    }
}

#[cfg(test)]
mod tests;
