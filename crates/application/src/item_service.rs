use std::sync::Arc;

use stockroom_core::{AppError, AppResult, UserIdentity};
use stockroom_domain::{Item, ItemDraft, ItemId, Permission};

use crate::{ItemMutation, ItemRepository, SessionContext, require_permission};

/// Application service for stock item reads and attributed mutations.
#[derive(Clone)]
pub struct ItemService {
    repository: Arc<dyn ItemRepository>,
}

impl ItemService {
    /// Creates a new item service.
    #[must_use]
    pub fn new(repository: Arc<dyn ItemRepository>) -> Self {
        Self { repository }
    }

    /// Lists items, narrowed by `search` when it is not blank.
    pub async fn list_items(&self, actor: &UserIdentity, search: &str) -> AppResult<Vec<Item>> {
        require_permission(actor, Permission::ItemRead)?;

        let search = search.trim();
        let search = (!search.is_empty()).then_some(search);
        self.repository.list_items(search).await
    }

    /// Returns one item.
    pub async fn get_item(&self, actor: &UserIdentity, item_id: ItemId) -> AppResult<Item> {
        require_permission(actor, Permission::ItemRead)?;

        self.repository
            .find_item(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("item '{item_id}' does not exist")))
    }

    /// Creates an item attributed to the actor.
    pub async fn create_item(&self, actor: &UserIdentity, draft: ItemDraft) -> AppResult<Item> {
        require_permission(actor, Permission::ItemWrite)?;

        self.execute(actor, ItemMutation::Create(draft)).await
    }

    /// Replaces an item's fields, attributed to the actor.
    pub async fn update_item(
        &self,
        actor: &UserIdentity,
        item_id: ItemId,
        draft: ItemDraft,
    ) -> AppResult<Item> {
        require_permission(actor, Permission::ItemWrite)?;

        self.execute(actor, ItemMutation::Update { item_id, draft })
            .await
    }

    /// Deletes an item attributed to the actor and returns its last state.
    pub async fn delete_item(&self, actor: &UserIdentity, item_id: ItemId) -> AppResult<Item> {
        require_permission(actor, Permission::ItemDelete)?;

        self.execute(actor, ItemMutation::Delete { item_id }).await
    }

    async fn execute(&self, actor: &UserIdentity, mutation: ItemMutation) -> AppResult<Item> {
        let context = SessionContext::for_user(actor);
        self.repository.apply_mutation(&context, mutation).await
    }
}
