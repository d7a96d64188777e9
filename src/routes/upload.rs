use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    routing::post,
};
use serde::Deserialize;
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::upload_service::{self, MAX_UPLOAD_BYTES, UploadedImage},
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadQuery {
    pub filename: String,
}

/// Raw-body image upload, capped at 5MB independently of the API-wide body limit.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_image))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
}

#[utoipa::path(
    post,
    path = "/api/upload",
    params(
        ("filename" = String, Query, description = "Original file name; its extension must be jpg, jpeg, png, webp or gif")
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Stored image URL", body = ApiResponse<UploadedImage>),
        (status = 400, description = "Unsupported type or empty body"),
        (status = 403, description = "Forbidden"),
        (status = 413, description = "Payload too large")
    ),
    security(("bearer_auth" = [])),
    tag = "Upload"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> AppResult<Json<ApiResponse<UploadedImage>>> {
    let resp = upload_service::save_image(&state, &user, &query.filename, body).await?;
    Ok(Json(resp))
}
