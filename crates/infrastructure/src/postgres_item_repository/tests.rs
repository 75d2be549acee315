use chrono::Utc;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use stockroom_application::{
    HistoryFilter, HistoryRepository, ItemMutation, ItemRepository, SessionContext,
};
use stockroom_core::{AppError, Role};
use stockroom_domain::{HistoryAction, ItemDraft, ItemId};

use super::PostgresItemRepository;
use crate::PostgresHistoryRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres item tests: {error}");
    }

    Some(pool)
}

fn unique_sku(prefix: &str) -> String {
    format!(
        "{prefix}-{}",
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

fn draft(sku: &str, qty: i32) -> ItemDraft {
    ItemDraft::new(sku, "Widget", qty, None).unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn mutations_write_attributed_history_rows() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let items = PostgresItemRepository::new(pool.clone());
    let history = PostgresHistoryRepository::new(pool);
    let alice = SessionContext::new("alice", Role::Manager);
    let sku = unique_sku("ATTR");

    let created = items
        .apply_mutation(&alice, ItemMutation::Create(draft(&sku, 5)))
        .await;
    assert!(created.is_ok());
    let item_id = created.map(|item| item.id()).unwrap_or(ItemId::new(0));

    let updated = items
        .apply_mutation(
            &alice,
            ItemMutation::Update {
                item_id,
                draft: draft(&sku, 10),
            },
        )
        .await;
    assert_eq!(updated.map(|item| item.qty()).ok(), Some(10));

    let entries = history
        .list_by_item(item_id, &HistoryFilter::default())
        .await;
    assert!(matches!(entries, Ok(ref entries) if entries.len() == 2));
    let entries = entries.unwrap_or_default();
    assert_eq!(entries[0].action(), HistoryAction::Update);
    assert_eq!(entries[1].action(), HistoryAction::Create);
    assert!(entries.iter().all(|entry| entry.actor() == Some("alice")));
    assert!(
        entries
            .iter()
            .all(|entry| entry.actor_role() == Some("manager"))
    );
}

#[tokio::test]
async fn missing_item_is_not_found_and_writes_nothing() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let items = PostgresItemRepository::new(pool.clone());
    let alice = SessionContext::new("alice", Role::Manager);
    let missing = ItemId::new(i64::MAX);

    let updated = items
        .apply_mutation(
            &alice,
            ItemMutation::Update {
                item_id: missing,
                draft: draft(&unique_sku("MISS"), 1),
            },
        )
        .await;
    let deleted = items
        .apply_mutation(&alice, ItemMutation::Delete { item_id: missing })
        .await;

    assert!(matches!(updated, Err(AppError::NotFound(_))));
    assert!(matches!(deleted, Err(AppError::NotFound(_))));

    let entries = PostgresHistoryRepository::new(pool)
        .list_by_item(missing, &HistoryFilter::default())
        .await;
    assert!(matches!(entries, Ok(ref entries) if entries.is_empty()));
}

#[tokio::test]
async fn duplicate_sku_maps_to_conflict_and_rolls_back() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let items = PostgresItemRepository::new(pool.clone());
    let history = PostgresHistoryRepository::new(pool);
    let alice = SessionContext::new("alice", Role::Manager);
    let sku = unique_sku("DUP");

    let created = items
        .apply_mutation(&alice, ItemMutation::Create(draft(&sku, 5)))
        .await;
    assert!(created.is_ok());
    let item_id = created.map(|item| item.id()).unwrap_or(ItemId::new(0));

    let duplicate = items
        .apply_mutation(&alice, ItemMutation::Create(draft(&sku, 7)))
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let listed = items.list_items(Some(sku.as_str())).await;
    assert!(matches!(listed, Ok(ref listed) if listed.len() == 1));
    assert_eq!(listed.map(|listed| listed[0].qty()).ok(), Some(5));

    let entries = history
        .list_by_item(item_id, &HistoryFilter::default())
        .await;
    assert!(matches!(entries, Ok(ref entries) if entries.len() == 1));
    assert_eq!(
        entries.map(|entries| entries[0].action()).ok(),
        Some(HistoryAction::Create)
    );
}

#[tokio::test]
async fn update_to_taken_sku_rolls_back_after_binding() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let items = PostgresItemRepository::new(pool.clone());
    let history = PostgresHistoryRepository::new(pool);
    let alice = SessionContext::new("alice", Role::Manager);
    let taken = unique_sku("TAKEN");
    let own = unique_sku("OWN");

    let first = items
        .apply_mutation(&alice, ItemMutation::Create(draft(&taken, 5)))
        .await;
    assert!(first.is_ok());
    let second = items
        .apply_mutation(&alice, ItemMutation::Create(draft(&own, 3)))
        .await;
    assert!(second.is_ok());
    let item_id = second.map(|item| item.id()).unwrap_or(ItemId::new(0));

    let result = items
        .apply_mutation(
            &alice,
            ItemMutation::Update {
                item_id,
                draft: draft(&taken, 99),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let stored = items.find_item(item_id).await;
    assert!(matches!(stored, Ok(Some(_))));
    let stored = stored.ok().flatten();
    assert_eq!(stored.as_ref().map(|item| item.sku()), Some(own.as_str()));
    assert_eq!(stored.as_ref().map(|item| item.qty()), Some(3));

    let entries = history
        .list_by_item(item_id, &HistoryFilter::default())
        .await;
    assert!(matches!(entries, Ok(ref entries) if entries.len() == 1));
    assert_eq!(
        entries.map(|entries| entries[0].action()).ok(),
        Some(HistoryAction::Create)
    );
}

#[tokio::test]
async fn session_context_does_not_outlive_the_transaction() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let items = PostgresItemRepository::new(pool.clone());
    let alice = SessionContext::new("alice", Role::Manager);
    assert!(
        items
            .apply_mutation(&alice, ItemMutation::Create(draft(&unique_sku("SCOPE"), 1)))
            .await
            .is_ok()
    );

    let sku = unique_sku("RAW");
    let raw_insert = sqlx::query_scalar::<_, i64>(
        "INSERT INTO items (sku, name, qty) VALUES ($1, 'Raw', 1) RETURNING id",
    )
    .bind(sku.as_str())
    .fetch_one(&pool)
    .await;
    assert!(raw_insert.is_ok());
    let raw_id = ItemId::new(raw_insert.unwrap_or_default());

    let entries = PostgresHistoryRepository::new(pool)
        .list_by_item(raw_id, &HistoryFilter::default())
        .await;
    assert!(matches!(entries, Ok(ref entries) if entries.len() == 1));
    let entries = entries.unwrap_or_default();
    assert_eq!(entries[0].actor(), None);
    assert_eq!(entries[0].actor_role(), None);
}

#[tokio::test]
async fn delete_returns_last_state_and_keeps_history() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let items = PostgresItemRepository::new(pool.clone());
    let alice = SessionContext::new("alice", Role::Manager);
    let admin = SessionContext::new("root", Role::Admin);
    let sku = unique_sku("DEL");

    let item_id = items
        .apply_mutation(&alice, ItemMutation::Create(draft(&sku, 4)))
        .await
        .map(|item| item.id())
        .unwrap_or(ItemId::new(0));

    let deleted = items
        .apply_mutation(&admin, ItemMutation::Delete { item_id })
        .await;
    assert_eq!(deleted.map(|item| item.qty()).ok(), Some(4));
    assert!(matches!(items.find_item(item_id).await, Ok(None)));

    let entries = PostgresHistoryRepository::new(pool)
        .list_by_item(item_id, &HistoryFilter::default())
        .await;
    assert!(matches!(entries, Ok(ref entries) if entries.len() == 2));
    let entries = entries.unwrap_or_default();
    assert_eq!(entries[0].action(), HistoryAction::Delete);
    assert_eq!(entries[0].actor(), Some("root"));
    assert!(entries[0].new_data().is_none());
}
