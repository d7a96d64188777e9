use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use rust_decimal::Decimal;

use crate::{
    audit,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SearchQuery, SortOrder},
    state::AppState,
};

fn substring_match(term: &str) -> Condition {
    let pattern = format!("%{}%", term.trim());
    Condition::any()
        .add(Expr::col(Column::Name).ilike(pattern.clone()))
        .add(Expr::col(Column::Description).ilike(pattern))
}

/// Storefront listing. A database failure degrades to an empty page instead of an error.
pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if !query.include_inactive.unwrap_or(false) {
        condition = condition.add(Column::IsActive.eq(true));
    }

    if let Some(category) = query.category {
        condition = condition.add(Column::Category.eq(category));
    }

    if let Some(search) = query.q.as_ref().filter(|s| !s.trim().is_empty()) {
        condition = condition.add(substring_match(search));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = match finder.clone().count(&state.orm).await {
        Ok(total) => total as i64,
        Err(err) => {
            tracing::error!(error = %err, "product listing unavailable, returning empty page");
            return Ok(ApiResponse::success(
                "Products",
                ProductList { items: Vec::new() },
                Some(Meta::new(page, limit, 0)),
            ));
        }
    };

    let items = match finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await
    {
        Ok(rows) => rows.into_iter().map(Product::from).collect(),
        Err(err) => {
            tracing::error!(error = %err, "product listing unavailable, returning empty page");
            Vec::new()
        }
    };

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

/// Substring search over name and description of active products.
pub async fn search_products(
    state: &AppState,
    query: SearchQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let term = query.q.trim();
    if term.is_empty() {
        return Ok(ApiResponse::success(
            "Products",
            ProductList { items: Vec::new() },
            Some(Meta::empty()),
        ));
    }

    let limit = query.limit.unwrap_or(20).clamp(1, 100) as u64;
    let items = match Products::find()
        .filter(
            Condition::all()
                .add(Column::IsActive.eq(true))
                .add(substring_match(term)),
        )
        .order_by_asc(Column::Name)
        .limit(limit)
        .all(&state.orm)
        .await
    {
        Ok(rows) => rows.into_iter().map(Product::from).collect(),
        Err(err) => {
            tracing::error!(error = %err, term, "product search unavailable");
            Vec::new()
        }
    };

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_product(state: &AppState, id: i32) -> AppResult<ApiResponse<Product>> {
    let result = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Product::from);
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", result, None))
}

/// Loads the given products keyed by id. Ids that no longer resolve are simply absent.
pub async fn find_products_by_ids<C>(conn: &C, ids: &[i32]) -> AppResult<HashMap<i32, ProductModel>>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Products::find()
        .filter(Column::Id.is_in(ids.iter().copied()))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|p| (p.id, p)).collect())
}

/// Like [`find_products_by_ids`], restricted to products that can still be bought.
pub async fn find_active_products_by_ids<C>(
    conn: &C,
    ids: &[i32],
) -> AppResult<HashMap<i32, ProductModel>>
where
    C: ConnectionTrait,
{
    let mut products = find_products_by_ids(conn, ids).await?;
    products.retain(|_, product| product.is_active);
    Ok(products)
}

fn validate_prices(price: Decimal, discount_price: Option<Decimal>) -> AppResult<()> {
    if price.is_sign_negative() {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if let Some(discount) = discount_price {
        if discount.is_sign_negative() || discount > price {
            return Err(AppError::BadRequest(
                "discount price must be between 0 and the list price".into(),
            ));
        }
    }
    Ok(())
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    validate_prices(payload.price, payload.discount_price)?;
    if payload.stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }

    let active = ActiveModel {
        id: NotSet,
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        category: Set(payload.category),
        price: Set(payload.price),
        discount_price: Set(payload.discount_price),
        image: Set(payload.image.or_else(|| payload.images.first().cloned())),
        images: Set(payload.images),
        sizes: Set(payload.sizes),
        notes: Set(payload.notes),
        stock: Set(payload.stock),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let price = payload.price.unwrap_or(existing.price);
    let discount_price = payload.discount_price.unwrap_or(existing.discount_price);
    validate_prices(price, discount_price)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("name is required".into()));
        }
        active.name = Set(name.to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    active.price = Set(price);
    active.discount_price = Set(discount_price);
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    if let Some(images) = payload.images {
        active.images = Set(images);
    }
    if let Some(sizes) = payload.sizes {
        active.sizes = Set(sizes);
    }
    if let Some(notes) = payload.notes {
        active.notes = Set(Some(notes));
    }
    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::BadRequest("stock must not be negative".into()));
        }
        active.stock = Set(stock);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

/// Existing cart lines and order items keep their dangling product ids.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
