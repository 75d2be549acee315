use async_trait::async_trait;
use stockroom_core::{AppResult, Role, UserIdentity};
use stockroom_domain::{HistoryAction, Item, ItemDraft, ItemId};

/// Actor attribution bound to a mutating transaction.
///
/// Storage-side audit logic reads these values from transaction-local state;
/// they are never persisted by the application and vanish on commit or rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    actor: String,
    role: Role,
}

impl SessionContext {
    /// Creates a context from an actor identity and role.
    #[must_use]
    pub fn new(actor: impl Into<String>, role: Role) -> Self {
        Self {
            actor: actor.into(),
            role,
        }
    }

    /// Takes the authenticated principal verbatim.
    #[must_use]
    pub fn for_user(user: &UserIdentity) -> Self {
        Self::new(user.subject(), user.role())
    }

    /// Returns the actor identity.
    #[must_use]
    pub fn actor(&self) -> &str {
        self.actor.as_str()
    }

    /// Returns the actor role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }
}

/// One item mutation executed inside an attributed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemMutation {
    /// Inserts a new item.
    Create(ItemDraft),
    /// Replaces every mutable field of an existing item.
    Update {
        /// Targeted item.
        item_id: ItemId,
        /// Replacement values.
        draft: ItemDraft,
    },
    /// Removes an existing item.
    Delete {
        /// Targeted item.
        item_id: ItemId,
    },
}

impl ItemMutation {
    /// Returns the ledger action this mutation produces.
    #[must_use]
    pub fn action(&self) -> HistoryAction {
        match self {
            Self::Create(_) => HistoryAction::Create,
            Self::Update { .. } => HistoryAction::Update,
            Self::Delete { .. } => HistoryAction::Delete,
        }
    }
}

/// Repository port for stock items.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Lists items ordered by identifier, optionally narrowed by a
    /// case-insensitive substring of sku, name or location.
    async fn list_items(&self, search: Option<&str>) -> AppResult<Vec<Item>>;

    /// Finds one item by identifier.
    async fn find_item(&self, item_id: ItemId) -> AppResult<Option<Item>>;

    /// Executes a mutation in a single transaction attributed to `context`.
    ///
    /// The item change and its ledger row commit together or not at all.
    /// Update and delete of a missing item fail with `NotFound`, a duplicate
    /// SKU fails with `Conflict`. Delete returns the removed item's last state.
    async fn apply_mutation(
        &self,
        context: &SessionContext,
        mutation: ItemMutation,
    ) -> AppResult<Item>;
}
