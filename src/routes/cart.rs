use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};

use crate::{
    dto::cart::{
        AddToCartRequest, CartView, GuestCartLines, GuestCartMutation, GuestCartRequest,
        MergeCartRequest, RemoveCartItemQuery, UpdateCartItemRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list).post(add_to_cart).delete(clear_cart))
        .route(
            "/{product_id}",
            put(update_cart_item).delete(remove_from_cart),
        )
        .route("/merge", post(merge_cart))
        .route("/guest/view", post(guest_view))
        .route("/guest/add", post(guest_add))
        .route("/guest/update", post(guest_update))
        .route("/guest/remove", post(guest_remove))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart lines of the current user joined with products", body = ApiResponse<CartView>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::get_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add or increment a cart line", body = ApiResponse<CartView>),
        (status = 400, description = "Invalid quantity or unknown product"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::add_to_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = i32, Path, description = "Product ID")
    ),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Set quantity; zero or less removes the line", body = ApiResponse<CartView>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<i32>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::update_cart_item(&state, &user, product_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = i32, Path, description = "Product ID"),
        ("size" = Option<String>, Query, description = "Selected size")
    ),
    responses(
        (status = 200, description = "Line removed, or nothing to remove", body = ApiResponse<CartView>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<i32>,
    Query(query): Query<RemoveCartItemQuery>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::remove_from_cart(&state, &user, product_id, query.size).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<serde_json::Value>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::clear_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/merge",
    request_body = MergeCartRequest,
    responses(
        (status = 200, description = "Guest lines folded into the account cart, once per login", body = ApiResponse<CartView>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn merge_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<MergeCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::merge_guest_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/guest/view",
    request_body = GuestCartRequest,
    responses(
        (status = 200, description = "Guest lines joined with products", body = ApiResponse<CartView>),
    ),
    tag = "Cart"
)]
pub async fn guest_view(
    State(state): State<AppState>,
    Json(payload): Json<GuestCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::guest_view(&state, payload.lines).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/guest/add",
    request_body = GuestCartMutation,
    responses(
        (status = 200, description = "Updated guest lines", body = ApiResponse<GuestCartLines>),
        (status = 400, description = "Invalid quantity or unknown product"),
    ),
    tag = "Cart"
)]
pub async fn guest_add(
    State(state): State<AppState>,
    Json(payload): Json<GuestCartMutation>,
) -> AppResult<Json<ApiResponse<GuestCartLines>>> {
    let resp = cart_service::guest_add(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/guest/update",
    request_body = GuestCartMutation,
    responses(
        (status = 200, description = "Updated guest lines", body = ApiResponse<GuestCartLines>),
    ),
    tag = "Cart"
)]
pub async fn guest_update(
    Json(payload): Json<GuestCartMutation>,
) -> AppResult<Json<ApiResponse<GuestCartLines>>> {
    let resp = cart_service::guest_update(payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/guest/remove",
    request_body = GuestCartMutation,
    responses(
        (status = 200, description = "Updated guest lines", body = ApiResponse<GuestCartLines>),
    ),
    tag = "Cart"
)]
pub async fn guest_remove(
    Json(payload): Json<GuestCartMutation>,
) -> AppResult<Json<ApiResponse<GuestCartLines>>> {
    let resp = cart_service::guest_remove(payload).await?;
    Ok(Json(resp))
}
