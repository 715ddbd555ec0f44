use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};

use crate::error::AppResult;
use crate::middleware::AuthenticatedUser;
use crate::models::{LoginRequest, TokenResponse, UserCreate, UserResponse};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    Json(data): Json<UserCreate>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state.auth.register(data).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    Json(data): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state.auth.login(data).await?;
    Ok(Json(token))
}

async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<UserResponse>> {
    let user = state.auth.get_user(user.user_id).await?;
    Ok(Json(user.into()))
}
