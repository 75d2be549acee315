use axum::Json;
use axum::extract::{Extension, FromRef, Path, Query, State};
use axum::http::{StatusCode, header};
use stockroom_application::HistoryService;
use stockroom_core::UserIdentity;
use stockroom_domain::ItemId;

use crate::dto::HistoryEntryResponse;
use crate::error::ApiResult;
use crate::state::AppState;

mod csv;
mod query;

pub use query::HistoryQuery;

use csv::render_history_csv;

#[derive(Clone)]
pub struct HistoryState {
    pub history_service: HistoryService,
}

impl FromRef<AppState> for HistoryState {
    fn from_ref(input: &AppState) -> Self {
        Self {
            history_service: input.history_service.clone(),
        }
    }
}

pub async fn list_item_history_handler(
    State(state): State<HistoryState>,
    Extension(user): Extension<UserIdentity>,
    Path(item_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<HistoryEntryResponse>>> {
    let include_changes = query.include_changes();
    let entries = state
        .history_service
        .list_item_history(&user, ItemId::new(item_id), query.into_filter()?, include_changes)
        .await?
        .into_iter()
        .map(HistoryEntryResponse::from)
        .collect();

    Ok(Json(entries))
}

pub async fn export_item_history_handler(
    State(state): State<HistoryState>,
    Extension(user): Extension<UserIdentity>,
    Path(item_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<(StatusCode, [(header::HeaderName, String); 2], String)> {
    let entries = state
        .history_service
        .list_item_history(&user, ItemId::new(item_id), query.into_filter()?, false)
        .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"item-{item_id}-history.csv\""),
            ),
        ],
        render_history_csv(&entries),
    ))
}
