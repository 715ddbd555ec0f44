use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::auth_middleware;
use crate::AppState;

pub mod auth;
pub mod containers;
pub mod items;
pub mod reports;
pub mod scan;
pub mod topology;
pub mod uploads;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth::router())
        .nest("/containers", containers::router())
        .nest("/items", items::router())
        .nest("/topology", topology::router())
        .nest("/scan", scan::router())
        .nest("/reports", reports::router())
        .nest("/uploads", uploads::router());

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health))
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
