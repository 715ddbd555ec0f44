use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::ItemModel;
use crate::storage::{local::allowed_extension, MAX_IMAGE_BYTES};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/image/:id", post(upload_image).delete(delete_image))
}

async fn upload_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<ItemModel>> {
    // existence check up front so bad ids fail before reading the body
    let item = state.inventory.get_item(id).await?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
        .ok_or_else(|| AppError::InvalidInput("No file field in request".to_string()))?;

    let filename = field
        .file_name()
        .ok_or_else(|| AppError::InvalidInput("Uploaded field has no filename".to_string()))?
        .to_string();
    let extension = allowed_extension(&filename).ok_or_else(|| {
        AppError::InvalidInput("Unsupported image format. Use jpg, png, gif or webp.".to_string())
    })?;

    let content = field
        .bytes()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Cannot read upload: {}", e)))?;
    if content.len() > MAX_IMAGE_BYTES {
        return Err(AppError::InvalidInput(
            "Image exceeds the 10 MB limit".to_string(),
        ));
    }

    if let Some(old_url) = &item.image_url {
        state.images.delete(old_url).await?;
    }
    let image_url = state.images.save(&extension, &content).await?;
    let item = state.inventory.set_image_url(id, Some(image_url)).await?;
    Ok(Json(item))
}

async fn delete_image(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    let item = state.inventory.get_item(id).await?;
    if let Some(old_url) = &item.image_url {
        state.images.delete(old_url).await?;
    }
    state.inventory.set_image_url(id, None).await?;
    Ok(StatusCode::NO_CONTENT)
}
