use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::topology_service::TopologyNode;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:id", get(tree))
}

async fn tree(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<TopologyNode>> {
    let tree = state.topology.get_topology_tree(id).await?;
    Ok(Json(tree))
}
