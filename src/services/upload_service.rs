use std::path::Path;

use axum::body::Bytes;
use serde::Serialize;
use tokio::fs;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedImage {
    pub url: String,
    pub size: usize,
}

/// Returns the lowercased extension when the file is an allowed, non-empty image
/// within the size cap.
pub fn validate_upload(filename: &str, len: usize) -> AppResult<String> {
    if len == 0 {
        return Err(AppError::BadRequest("empty upload".into()));
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest("image exceeds the 5MB limit".into()));
    }
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| AppError::BadRequest("file extension is required".into()))?;
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::BadRequest(format!(
            "unsupported file type .{extension}"
        )));
    }
    Ok(extension)
}

pub async fn save_image(
    state: &AppState,
    user: &AuthUser,
    filename: &str,
    body: Bytes,
) -> AppResult<ApiResponse<UploadedImage>> {
    ensure_admin(user)?;
    let extension = validate_upload(filename, body.len())?;

    let upload_dir = &state.config.upload_dir;
    fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("upload dir unavailable: {e}")))?;

    let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
    fs::write(upload_dir.join(&stored_name), &body)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to store upload: {e}")))?;

    tracing::info!(file = %stored_name, bytes = body.len(), "image uploaded");

    Ok(ApiResponse::success(
        "Uploaded",
        UploadedImage {
            url: format!("/uploads/{stored_name}"),
            size: body.len(),
        },
        Some(Meta::empty()),
    ))
}
