use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Extension, Json, Router};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthenticatedUser;
use crate::models::{
    AdjustPayload, ItemCreate, ItemListQuery, ItemModel, ItemPatch, MovePayload, PaginatedItems,
    StatusPayload,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(detail).patch(update).delete(delete_item))
        .route("/:id/adjust", post(adjust))
        .route("/:id/status", patch(change_status))
        .route("/:id/move", patch(move_item))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ItemListQuery>,
) -> AppResult<Json<PaginatedItems>> {
    let page = state.inventory.list_items(&query).await?;
    Ok(Json(page))
}

async fn create(
    State(state): State<AppState>,
    Json(data): Json<ItemCreate>,
) -> AppResult<(StatusCode, Json<ItemModel>)> {
    let item = state.inventory.create_item(data).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn detail(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<ItemModel>> {
    let item = state.inventory.get_item(id).await?;
    Ok(Json(item))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ItemPatch>,
) -> AppResult<Json<ItemModel>> {
    let item = state.inventory.update_item(id, patch).await?;
    Ok(Json(item))
}

async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !user.role.can_write() {
        return Err(AppError::Forbidden(
            "Insufficient permissions to delete".to_string(),
        ));
    }
    state.inventory.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn adjust(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustPayload>,
) -> AppResult<Json<ItemModel>> {
    let item = state.inventory.adjust_quantity(id, payload).await?;
    Ok(Json(item))
}

async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusPayload>,
) -> AppResult<Json<ItemModel>> {
    let item = state.inventory.change_status(id, payload).await?;
    Ok(Json(item))
}

async fn move_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MovePayload>,
) -> AppResult<Json<ItemModel>> {
    let item = state.inventory.move_item(id, payload).await?;
    Ok(Json(item))
}
