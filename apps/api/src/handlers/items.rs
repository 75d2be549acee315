use axum::Json;
use axum::extract::{Extension, FromRef, Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use stockroom_application::ItemService;
use stockroom_core::UserIdentity;
use stockroom_domain::ItemId;
use tracing::info;

use crate::dto::{ItemRequest, ItemResponse};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Clone)]
pub struct ItemsState {
    pub item_service: ItemService,
}

impl FromRef<AppState> for ItemsState {
    fn from_ref(input: &AppState) -> Self {
        Self {
            item_service: input.item_service.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemListQuery {
    pub search: Option<String>,
}

pub async fn list_items_handler(
    State(state): State<ItemsState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<ItemListQuery>,
) -> ApiResult<Json<Vec<ItemResponse>>> {
    let items = state
        .item_service
        .list_items(&user, query.search.as_deref().unwrap_or_default())
        .await?
        .into_iter()
        .map(ItemResponse::from)
        .collect();

    Ok(Json(items))
}

pub async fn get_item_handler(
    State(state): State<ItemsState>,
    Extension(user): Extension<UserIdentity>,
    Path(item_id): Path<i64>,
) -> ApiResult<Json<ItemResponse>> {
    let item = state
        .item_service
        .get_item(&user, ItemId::new(item_id))
        .await?;

    Ok(Json(ItemResponse::from(item)))
}

pub async fn create_item_handler(
    State(state): State<ItemsState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<ItemRequest>,
) -> ApiResult<(StatusCode, Json<ItemResponse>)> {
    let item = state
        .item_service
        .create_item(&user, payload.into_draft()?)
        .await?;

    info!(actor = user.subject(), role = %user.role(), item_id = %item.id(), "item created");

    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

pub async fn update_item_handler(
    State(state): State<ItemsState>,
    Extension(user): Extension<UserIdentity>,
    Path(item_id): Path<i64>,
    Json(payload): Json<ItemRequest>,
) -> ApiResult<Json<ItemResponse>> {
    let item = state
        .item_service
        .update_item(&user, ItemId::new(item_id), payload.into_draft()?)
        .await?;

    info!(actor = user.subject(), role = %user.role(), item_id = %item.id(), "item updated");

    Ok(Json(ItemResponse::from(item)))
}

/// Returns the removed item's last state.
pub async fn delete_item_handler(
    State(state): State<ItemsState>,
    Extension(user): Extension<UserIdentity>,
    Path(item_id): Path<i64>,
) -> ApiResult<Json<ItemResponse>> {
    let item = state
        .item_service
        .delete_item(&user, ItemId::new(item_id))
        .await?;

    info!(actor = user.subject(), role = %user.role(), item_id = %item.id(), "item deleted");

    Ok(Json(ItemResponse::from(item)))
}

#[cfg(test)]
mod tests;
