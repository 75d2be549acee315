use chrono::{Duration, Utc};
use serde_json::json;
use stockroom_application::{
    HistoryFilter, HistoryRepository, ItemMutation, ItemRepository, SessionContext,
};
use stockroom_core::{AppError, Role};
use stockroom_domain::{
    HistoryAction, HistoryEntry, HistoryEntryParts, IgnoredFields, ItemDraft, ItemId,
};

use super::{InMemoryItemRepository, sort_newest_first};

fn draft(sku: &str, qty: i32) -> ItemDraft {
    ItemDraft::new(sku, "Widget", qty, Some("Aisle 3".to_owned()))
        .unwrap_or_else(|_| unreachable!())
}

fn alice() -> SessionContext {
    SessionContext::new("alice", Role::Manager)
}

#[tokio::test]
async fn create_then_update_is_attributed_and_diffable() {
    let repository = InMemoryItemRepository::new();

    let created = repository
        .apply_mutation(&alice(), ItemMutation::Create(draft("A1", 5)))
        .await;
    assert!(created.is_ok());
    let item_id = created.map(|item| item.id()).unwrap_or(ItemId::new(0));

    let updated = repository
        .apply_mutation(
            &alice(),
            ItemMutation::Update {
                item_id,
                draft: draft("A1", 10),
            },
        )
        .await;
    assert_eq!(updated.map(|item| item.qty()).ok(), Some(10));

    let entries = repository
        .list_by_item(item_id, &HistoryFilter::default())
        .await;
    assert!(matches!(entries, Ok(ref entries) if entries.len() == 2));
    let entries = entries.unwrap_or_default();
    assert_eq!(entries[0].action(), HistoryAction::Update);
    assert_eq!(entries[1].action(), HistoryAction::Create);
    assert!(
        entries
            .iter()
            .all(|entry| entry.actor() == Some("alice") && entry.actor_role() == Some("manager"))
    );
    assert!(entries[1].old_data().is_none());

    let update = entries[0].clone().with_changes(&IgnoredFields::default());
    let changes = update.changes();
    assert_eq!(changes.map(|changes| changes.len()), Some(1));
    let qty = changes.and_then(|changes| changes.get("qty"));
    assert_eq!(qty.map(|change| &change.from), Some(&json!(5)));
    assert_eq!(qty.map(|change| &change.to), Some(&json!(10)));
}

#[tokio::test]
async fn updating_a_missing_item_fails_without_history() {
    let repository = InMemoryItemRepository::new();

    let result = repository
        .apply_mutation(
            &alice(),
            ItemMutation::Update {
                item_id: ItemId::new(999),
                draft: draft("A1", 1),
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    let entries = repository
        .list_by_item(ItemId::new(999), &HistoryFilter::default())
        .await;
    assert!(matches!(entries, Ok(ref entries) if entries.is_empty()));
}

#[tokio::test]
async fn duplicate_sku_conflicts_and_leaves_no_trace() {
    let repository = InMemoryItemRepository::new();

    assert!(
        repository
            .apply_mutation(&alice(), ItemMutation::Create(draft("A1", 5)))
            .await
            .is_ok()
    );
    let duplicate = repository
        .apply_mutation(&alice(), ItemMutation::Create(draft("A1", 7)))
        .await;

    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    assert_eq!(repository.list_items(None).await.map(|items| items.len()).ok(), Some(1));

    let ledger = repository
        .list_by_item(ItemId::new(1), &HistoryFilter::default())
        .await;
    assert!(matches!(ledger, Ok(ref entries) if entries.len() == 1));
    assert_eq!(
        ledger.map(|entries| entries[0].action()).ok(),
        Some(HistoryAction::Create)
    );

    let next = repository
        .apply_mutation(&alice(), ItemMutation::Create(draft("B2", 1)))
        .await;
    assert_eq!(next.map(|item| item.id()).ok(), Some(ItemId::new(2)));
}

#[tokio::test]
async fn updating_to_a_taken_sku_leaves_item_and_ledger_untouched() {
    let repository = InMemoryItemRepository::new();
    let first = repository
        .apply_mutation(&alice(), ItemMutation::Create(draft("A1", 5)))
        .await
        .map(|item| item.id());
    let second = repository
        .apply_mutation(&alice(), ItemMutation::Create(draft("B2", 3)))
        .await
        .map(|item| item.id());
    assert!(first.is_ok());
    let second = second.unwrap_or(ItemId::new(0));

    let result = repository
        .apply_mutation(
            &alice(),
            ItemMutation::Update {
                item_id: second,
                draft: draft("A1", 99),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let stored = repository.find_item(second).await;
    assert!(matches!(stored, Ok(Some(_))));
    let stored = stored.ok().flatten();
    assert_eq!(stored.as_ref().map(|item| item.sku()), Some("B2"));
    assert_eq!(stored.as_ref().map(|item| item.qty()), Some(3));

    let ledger = repository
        .list_by_item(second, &HistoryFilter::default())
        .await;
    assert!(matches!(ledger, Ok(ref entries) if entries.len() == 1));
    assert_eq!(
        ledger.map(|entries| entries[0].action()).ok(),
        Some(HistoryAction::Create)
    );
}

#[tokio::test]
async fn updating_to_own_sku_is_not_a_conflict() {
    let repository = InMemoryItemRepository::new();
    let _ = repository
        .apply_mutation(&alice(), ItemMutation::Create(draft("A1", 5)))
        .await;

    let result = repository
        .apply_mutation(
            &alice(),
            ItemMutation::Update {
                item_id: ItemId::new(1),
                draft: draft("A1", 6),
            },
        )
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn delete_returns_last_state_and_history_survives() {
    let repository = InMemoryItemRepository::new();
    let admin = SessionContext::new("root", Role::Admin);
    let _ = repository
        .apply_mutation(&alice(), ItemMutation::Create(draft("A1", 5)))
        .await;

    let deleted = repository
        .apply_mutation(
            &admin,
            ItemMutation::Delete {
                item_id: ItemId::new(1),
            },
        )
        .await;

    assert_eq!(deleted.map(|item| item.qty()).ok(), Some(5));
    assert!(matches!(
        repository.find_item(ItemId::new(1)).await,
        Ok(None)
    ));

    let entries = repository
        .list_by_item(ItemId::new(1), &HistoryFilter::default())
        .await;
    assert!(matches!(entries, Ok(ref entries) if entries.len() == 2));
    let entries = entries.unwrap_or_default();
    assert_eq!(entries[0].action(), HistoryAction::Delete);
    assert_eq!(entries[0].actor_role(), Some("admin"));
    assert!(entries[0].new_data().is_none());
    assert_eq!(
        entries[0].old_data().and_then(|data| data.get("sku")),
        Some(&json!("A1"))
    );
}

#[tokio::test]
async fn action_filter_without_matches_is_empty() {
    let repository = InMemoryItemRepository::new();
    let _ = repository
        .apply_mutation(&alice(), ItemMutation::Create(draft("A1", 5)))
        .await;

    let filter = HistoryFilter::new(None, None, None, Some("delete".to_owned()));
    let entries = repository.list_by_item(ItemId::new(1), &filter).await;

    assert!(matches!(entries, Ok(ref entries) if entries.is_empty()));
}

#[tokio::test]
async fn search_is_case_insensitive_across_fields() {
    let repository = InMemoryItemRepository::new();
    let _ = repository
        .apply_mutation(&alice(), ItemMutation::Create(draft("A1", 5)))
        .await;
    let bolt = ItemDraft::new("B2", "Bolt", 3, None).unwrap_or_else(|_| unreachable!());
    let _ = repository
        .apply_mutation(&alice(), ItemMutation::Create(bolt))
        .await;

    let by_location = repository.list_items(Some("aisle")).await.unwrap_or_default();
    let by_name = repository.list_items(Some("BOL")).await.unwrap_or_default();
    let all = repository.list_items(None).await.unwrap_or_default();

    assert_eq!(by_location.len(), 1);
    assert_eq!(by_location[0].sku(), "A1");
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].sku(), "B2");
    assert_eq!(
        all.iter().map(|item| item.id().as_i64()).collect::<Vec<_>>(),
        vec![1, 2]
    );
}

#[test]
fn same_timestamp_entries_order_by_id_descending() {
    let changed_at = Utc::now();
    let entry = |id, changed_at| {
        HistoryEntry::new(HistoryEntryParts {
            id,
            item_id: ItemId::new(1),
            action: HistoryAction::Update,
            actor: Some("alice".to_owned()),
            actor_role: Some("manager".to_owned()),
            changed_at,
            old_data: None,
            new_data: None,
        })
    };
    let mut entries = vec![
        entry(3, changed_at),
        entry(9, changed_at - Duration::seconds(1)),
        entry(7, changed_at),
        entry(5, changed_at),
    ];

    sort_newest_first(&mut entries);

    assert_eq!(
        entries.iter().map(HistoryEntry::id).collect::<Vec<_>>(),
        vec![7, 5, 3, 9]
    );
}
