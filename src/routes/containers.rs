use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthenticatedUser;
use crate::models::{ContainerCreate, ContainerDetail, ContainerModel, ContainerPatch};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(detail).patch(update).delete(delete_container))
}

async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<ContainerModel>>> {
    let containers = state.inventory.list_containers().await?;
    Ok(Json(containers))
}

async fn create(
    State(state): State<AppState>,
    Json(data): Json<ContainerCreate>,
) -> AppResult<(StatusCode, Json<ContainerModel>)> {
    let container = state.inventory.create_container(data).await?;
    Ok((StatusCode::CREATED, Json(container)))
}

async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ContainerDetail>> {
    let detail = state.inventory.get_container_detail(id).await?;
    Ok(Json(detail))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ContainerPatch>,
) -> AppResult<Json<ContainerModel>> {
    let container = state.inventory.update_container(id, patch).await?;
    Ok(Json(container))
}

async fn delete_container(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !user.role.can_write() {
        return Err(AppError::Forbidden(
            "Insufficient permissions to delete".to_string(),
        ));
    }
    state.inventory.delete_container(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
