use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::AppResult;
use crate::models::{ItemModel, ItemStatus, SummaryReport};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/low-stock", get(low_stock))
        .route("/idle-assets", get(idle_assets))
        .route("/loaned", get(loaned))
        .route("/summary", get(summary))
}

async fn low_stock(State(state): State<AppState>) -> AppResult<Json<Vec<ItemModel>>> {
    let items = state.inventory.low_stock_report().await?;
    Ok(Json(items))
}

async fn idle_assets(State(state): State<AppState>) -> AppResult<Json<Vec<ItemModel>>> {
    let items = state.inventory.status_report(ItemStatus::Idle).await?;
    Ok(Json(items))
}

async fn loaned(State(state): State<AppState>) -> AppResult<Json<Vec<ItemModel>>> {
    let items = state.inventory.status_report(ItemStatus::Loaned).await?;
    Ok(Json(items))
}

async fn summary(State(state): State<AppState>) -> AppResult<Json<SummaryReport>> {
    let report = state.inventory.summary_report().await?;
    Ok(Json(report))
}
