use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use stockroom_application::{HistoryFilter, HistoryRepository};
use stockroom_core::{AppError, AppResult};
use stockroom_domain::{HistoryAction, HistoryEntry, HistoryEntryParts, ItemId};

/// PostgreSQL-backed reader for the `items_history` ledger.
#[derive(Clone)]
pub struct PostgresHistoryRepository {
    pool: PgPool,
}

impl PostgresHistoryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: i64,
    item_id: i64,
    action: String,
    actor: Option<String>,
    actor_role: Option<String>,
    changed_at: DateTime<Utc>,
    old_data: Option<Value>,
    new_data: Option<Value>,
}

#[async_trait]
impl HistoryRepository for PostgresHistoryRepository {
    async fn list_by_item(
        &self,
        item_id: ItemId,
        filter: &HistoryFilter,
    ) -> AppResult<Vec<HistoryEntry>> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT id, item_id, action, actor, actor_role, changed_at, old_data, new_data \
             FROM items_history WHERE item_id = ",
        );
        builder.push_bind(item_id.as_i64());

        if let Some(from) = filter.from() {
            builder.push(" AND changed_at >= ");
            builder.push_bind(from);
        }
        if let Some(to) = filter.to() {
            builder.push(" AND changed_at <= ");
            builder.push_bind(to);
        }
        if let Some(actor) = filter.actor() {
            builder.push(" AND actor = ");
            builder.push_bind(actor.to_owned());
        }
        if let Some(action) = filter.action() {
            builder.push(" AND action = ");
            builder.push_bind(action.to_owned());
        }

        builder.push(" ORDER BY changed_at DESC, id DESC");

        let rows = builder
            .build_query_as::<HistoryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to load history for item '{item_id}': {error}"
                ))
            })?;

        rows.into_iter().map(entry_from_row).collect()
    }
}

fn entry_from_row(row: HistoryRow) -> AppResult<HistoryEntry> {
    let action = HistoryAction::from_str(row.action.as_str()).map_err(|error| {
        AppError::Internal(format!("history entry '{}' is invalid: {error}", row.id))
    })?;

    Ok(HistoryEntry::new(HistoryEntryParts {
        id: row.id,
        item_id: ItemId::new(row.item_id),
        action,
        actor: row.actor,
        actor_role: row.actor_role,
        changed_at: row.changed_at,
        old_data: row.old_data,
        new_data: row.new_data,
    }))
}
