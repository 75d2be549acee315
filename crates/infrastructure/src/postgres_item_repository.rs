use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use stockroom_application::{ItemMutation, ItemRepository, SessionContext};
use stockroom_core::{AppError, AppResult};
use stockroom_domain::{Item, ItemDraft, ItemId};

use crate::postgres_session_context::bind_session_context;

/// PostgreSQL-backed item repository.
///
/// Every mutation runs in its own transaction: bind session context, execute
/// the statement, commit. The `items` audit trigger writes the ledger row
/// inside that same transaction.
#[derive(Clone)]
pub struct PostgresItemRepository {
    pool: PgPool,
}

impl PostgresItemRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: i64,
    sku: String,
    name: String,
    qty: i32,
    location: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[async_trait]
impl ItemRepository for PostgresItemRepository {
    async fn list_items(&self, search: Option<&str>) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, sku, name, qty, location, created_at, updated_at
            FROM items
            WHERE $1::TEXT IS NULL
                OR sku ILIKE '%' || $1 || '%'
                OR name ILIKE '%' || $1 || '%'
                OR COALESCE(location, '') ILIKE '%' || $1 || '%'
            ORDER BY id ASC
            "#,
        )
        .bind(search)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list items: {error}")))?;

        rows.into_iter().map(item_from_row).collect()
    }

    async fn find_item(&self, item_id: ItemId) -> AppResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, sku, name, qty, location, created_at, updated_at
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(item_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find item '{item_id}': {error}")))?;

        row.map(item_from_row).transpose()
    }

    async fn apply_mutation(
        &self,
        context: &SessionContext,
        mutation: ItemMutation,
    ) -> AppResult<Item> {
        let action = mutation.action().as_str();
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to start item {action} transaction: {error}"
            ))
        })?;

        match mutate_in_transaction(&mut transaction, context, mutation).await {
            Ok(item) => {
                transaction.commit().await.map_err(|error| {
                    AppError::Internal(format!(
                        "failed to commit item {action} transaction: {error}"
                    ))
                })?;

                Ok(item)
            }
            Err(error) => {
                // A failed explicit rollback is retried when the transaction drops.
                let _ = transaction.rollback().await;
                Err(error)
            }
        }
    }
}

async fn mutate_in_transaction(
    transaction: &mut Transaction<'_, Postgres>,
    context: &SessionContext,
    mutation: ItemMutation,
) -> AppResult<Item> {
    bind_session_context(transaction, context).await?;

    match mutation {
        ItemMutation::Create(draft) => insert_item(transaction, &draft).await,
        ItemMutation::Update { item_id, draft } => update_item(transaction, item_id, &draft).await,
        ItemMutation::Delete { item_id } => delete_item(transaction, item_id).await,
    }
}

async fn insert_item(
    transaction: &mut Transaction<'_, Postgres>,
    draft: &ItemDraft,
) -> AppResult<Item> {
    let row = sqlx::query_as::<_, ItemRow>(
        r#"
        INSERT INTO items (sku, name, qty, location)
        VALUES ($1, $2, $3, $4)
        RETURNING id, sku, name, qty, location, created_at, updated_at
        "#,
    )
    .bind(draft.sku().as_str())
    .bind(draft.name().as_str())
    .bind(draft.qty())
    .bind(draft.location())
    .fetch_one(&mut **transaction)
    .await
    .map_err(|error| write_error(error, draft, "failed to create item"))?;

    item_from_row(row)
}

async fn update_item(
    transaction: &mut Transaction<'_, Postgres>,
    item_id: ItemId,
    draft: &ItemDraft,
) -> AppResult<Item> {
    let row = sqlx::query_as::<_, ItemRow>(
        r#"
        UPDATE items
        SET sku = $2,
            name = $3,
            qty = $4,
            location = $5
        WHERE id = $1
        RETURNING id, sku, name, qty, location, created_at, updated_at
        "#,
    )
    .bind(item_id.as_i64())
    .bind(draft.sku().as_str())
    .bind(draft.name().as_str())
    .bind(draft.qty())
    .bind(draft.location())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| write_error(error, draft, &format!("failed to update item '{item_id}'")))?
    .ok_or_else(|| AppError::NotFound(format!("item '{item_id}' does not exist")))?;

    item_from_row(row)
}

async fn delete_item(
    transaction: &mut Transaction<'_, Postgres>,
    item_id: ItemId,
) -> AppResult<Item> {
    let row = sqlx::query_as::<_, ItemRow>(
        r#"
        DELETE FROM items
        WHERE id = $1
        RETURNING id, sku, name, qty, location, created_at, updated_at
        "#,
    )
    .bind(item_id.as_i64())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to delete item '{item_id}': {error}")))?
    .ok_or_else(|| AppError::NotFound(format!("item '{item_id}' does not exist")))?;

    item_from_row(row)
}

fn write_error(error: sqlx::Error, draft: &ItemDraft, context: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "sku '{}' must be unique",
            draft.sku().as_str()
        ));
    }

    AppError::Internal(format!("{context}: {error}"))
}

fn item_from_row(row: ItemRow) -> AppResult<Item> {
    let draft = ItemDraft::new(row.sku, row.name, row.qty, row.location).map_err(|error| {
        AppError::Internal(format!("persisted item '{}' is invalid: {error}", row.id))
    })?;

    Ok(Item::new(
        ItemId::new(row.id),
        draft,
        row.created_at,
        row.updated_at,
    ))
}

#[cfg(test)]
mod tests;
