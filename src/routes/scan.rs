use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::AppResult;
use crate::models::{ContainerModel, ItemModel};
use crate::services::qr_service;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:code", get(lookup))
        .route("/:code/qr-image", get(qr_image))
}

#[derive(Debug, Serialize)]
struct ScanResponse {
    container: ContainerModel,
    items: Vec<ItemModel>,
}

async fn lookup(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<ScanResponse>> {
    let (container, items) = state.inventory.scan_lookup(&code).await?;
    Ok(Json(ScanResponse { container, items }))
}

/// Printable QR label for a scan code. Renders without touching the
/// database so labels can be produced ahead of registering the container.
async fn qr_image(Path(code): Path<String>) -> AppResult<Response> {
    let png = qr_service::generate_qr_png(&code)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}
