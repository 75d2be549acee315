use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use stockroom_application::ItemService;
use stockroom_core::{AppError, Role, UserIdentity};
use stockroom_infrastructure::InMemoryItemRepository;

use super::{
    ItemListQuery, ItemsState, create_item_handler, delete_item_handler, get_item_handler,
    list_items_handler, update_item_handler,
};
use crate::dto::ItemRequest;
use crate::error::ApiError;

fn state() -> ItemsState {
    ItemsState {
        item_service: ItemService::new(Arc::new(InMemoryItemRepository::new())),
    }
}

fn manager() -> UserIdentity {
    UserIdentity::new("alice", Role::Manager)
}

fn request(sku: &str, qty: i32) -> ItemRequest {
    ItemRequest {
        sku: sku.to_owned(),
        name: "Widget".to_owned(),
        qty,
        location: Some("  ".to_owned()),
    }
}

#[tokio::test]
async fn create_returns_created_item() {
    let response =
        create_item_handler(State(state()), Extension(manager()), Json(request(" A1 ", 5))).await;
    assert!(response.is_ok());

    let (status, Json(item)) = response.unwrap_or_else(|_| unreachable!());
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item.sku, "A1");
    assert_eq!(item.qty, 5);
    assert_eq!(item.location, None);
}

#[tokio::test]
async fn invalid_payload_is_rejected_before_storage() {
    let state = state();

    let negative = create_item_handler(
        State(state.clone()),
        Extension(manager()),
        Json(request("A1", -1)),
    )
    .await;
    assert!(matches!(negative, Err(ApiError(AppError::Validation(_)))));

    let listed = list_items_handler(
        State(state),
        Extension(manager()),
        Query(ItemListQuery::default()),
    )
    .await;
    let Json(items) = listed.unwrap_or_else(|_| unreachable!());
    assert!(items.is_empty());
}

#[tokio::test]
async fn duplicate_sku_is_a_conflict() {
    let state = state();
    let first =
        create_item_handler(State(state.clone()), Extension(manager()), Json(request("A1", 5)))
            .await;
    assert!(first.is_ok());

    let second =
        create_item_handler(State(state), Extension(manager()), Json(request("A1", 7))).await;

    assert!(matches!(second, Err(ApiError(AppError::Conflict(_)))));
}

#[tokio::test]
async fn update_and_delete_of_missing_item_are_not_found() {
    let state = state();
    let admin = UserIdentity::new("root", Role::Admin);

    let updated = update_item_handler(
        State(state.clone()),
        Extension(manager()),
        Path(999),
        Json(request("A1", 1)),
    )
    .await;
    let deleted = delete_item_handler(State(state.clone()), Extension(admin), Path(999)).await;
    let fetched = get_item_handler(State(state), Extension(manager()), Path(999)).await;

    assert!(matches!(updated, Err(ApiError(AppError::NotFound(_)))));
    assert!(matches!(deleted, Err(ApiError(AppError::NotFound(_)))));
    assert!(matches!(fetched, Err(ApiError(AppError::NotFound(_)))));
}

#[tokio::test]
async fn viewers_read_but_cannot_write() {
    let state = state();
    let viewer = UserIdentity::new("vera", Role::Viewer);

    let created = create_item_handler(
        State(state.clone()),
        Extension(viewer.clone()),
        Json(request("A1", 5)),
    )
    .await;
    let listed = list_items_handler(
        State(state),
        Extension(viewer),
        Query(ItemListQuery {
            search: Some("a1".to_owned()),
        }),
    )
    .await;

    assert!(matches!(created, Err(ApiError(AppError::Forbidden(_)))));
    assert!(listed.is_ok());
}

#[tokio::test]
async fn delete_returns_last_state() {
    let state = state();
    let admin = UserIdentity::new("root", Role::Admin);
    let created =
        create_item_handler(State(state.clone()), Extension(manager()), Json(request("A1", 5)))
            .await;
    let (_, Json(item)) = created.unwrap_or_else(|_| unreachable!());

    let denied =
        delete_item_handler(State(state.clone()), Extension(manager()), Path(item.id)).await;
    assert!(matches!(denied, Err(ApiError(AppError::Forbidden(_)))));

    let deleted = delete_item_handler(State(state.clone()), Extension(admin), Path(item.id)).await;
    let Json(last_state) = deleted.unwrap_or_else(|_| unreachable!());
    assert_eq!(last_state.id, item.id);
    assert_eq!(last_state.qty, 5);

    let fetched = get_item_handler(State(state), Extension(manager()), Path(item.id)).await;
    assert!(matches!(fetched, Err(ApiError(AppError::NotFound(_)))));
}
