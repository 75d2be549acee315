use sqlx::PgPool;
use stockroom_application::{HistoryService, ItemService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub item_service: ItemService,
    pub history_service: HistoryService,
    pub postgres_pool: PgPool,
    pub frontend_url: String,
}
