//! Cart reconciliation.
//!
//! Both cart flavours sit behind [`CartRepository`]:
//! - [`AuthenticatedCart`] persists lines in `cart_items`, one line per (user, product).
//! - [`GuestCart`] holds the lines the browser keeps in local storage, one line per
//!   (product, size). The server never stores them; every guest call receives the
//!   current lines and answers with the updated ones.
//!
//! [`build_view`] joins either set of lines with catalog data for display.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::cart::{
        AddToCartRequest, CartLineView, CartView, GuestCartLines, GuestCartMutation,
        MergeCartRequest, UpdateCartItemRequest,
    },
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        cart_merges::ActiveModel as CartMergeActive,
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::AuthUser,
    models::{CartLine, Product, UNKNOWN_ITEM_LABEL},
    response::{ApiResponse, Meta},
    services::product_service::{find_active_products_by_ids, find_products_by_ids},
    state::AppState,
};

#[allow(async_fn_in_trait)]
pub trait CartRepository {
    async fn lines(&self) -> AppResult<Vec<CartLine>>;

    /// Increments an existing line or creates a new one. `quantity` must be at least 1.
    async fn add(&mut self, product_id: i32, quantity: i32, size: Option<String>)
    -> AppResult<()>;

    /// Sets the quantity of an existing line; a non-positive quantity removes it.
    async fn update_quantity(
        &mut self,
        product_id: i32,
        quantity: i32,
        size: Option<String>,
    ) -> AppResult<()>;

    /// Removing a line that does not exist is a no-op.
    async fn remove(&mut self, product_id: i32, size: Option<&str>) -> AppResult<()>;

    async fn clear(&mut self) -> AppResult<()>;
}

fn ensure_positive(quantity: i32) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::InvalidQuantity(quantity));
    }
    Ok(())
}

fn normalize_size(size: Option<String>) -> Option<String> {
    size.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Server-persisted cart of one user. Works on a plain connection or inside a transaction.
pub struct AuthenticatedCart<'a, C> {
    conn: &'a C,
    user_id: i32,
}

impl<'a, C: ConnectionTrait> AuthenticatedCart<'a, C> {
    pub fn new(conn: &'a C, user_id: i32) -> Self {
        Self { conn, user_id }
    }

    async fn find_line(
        &self,
        product_id: i32,
    ) -> AppResult<Option<crate::entity::cart_items::Model>> {
        let line = CartItems::find()
            .filter(CartCol::UserId.eq(self.user_id))
            .filter(CartCol::ProductId.eq(product_id))
            .one(self.conn)
            .await?;
        Ok(line)
    }
}

impl<C: ConnectionTrait> CartRepository for AuthenticatedCart<'_, C> {
    async fn lines(&self) -> AppResult<Vec<CartLine>> {
        let rows = CartItems::find()
            .filter(CartCol::UserId.eq(self.user_id))
            .order_by_asc(CartCol::CreatedAt)
            .order_by_asc(CartCol::Id)
            .all(self.conn)
            .await?;
        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    async fn add(
        &mut self,
        product_id: i32,
        quantity: i32,
        size: Option<String>,
    ) -> AppResult<()> {
        ensure_positive(quantity)?;
        let size = normalize_size(size);

        match self.find_line(product_id).await? {
            Some(existing) => {
                let new_quantity = existing.quantity.saturating_add(quantity);
                let mut active: CartActive = existing.into();
                active.quantity = Set(new_quantity);
                if size.is_some() {
                    active.selected_size = Set(size);
                }
                active.update(self.conn).await?;
            }
            None => {
                CartActive {
                    id: NotSet,
                    user_id: Set(self.user_id),
                    product_id: Set(product_id),
                    quantity: Set(quantity),
                    selected_size: Set(size),
                    created_at: NotSet,
                }
                .insert(self.conn)
                .await?;
            }
        }
        Ok(())
    }

    async fn update_quantity(
        &mut self,
        product_id: i32,
        quantity: i32,
        size: Option<String>,
    ) -> AppResult<()> {
        if quantity <= 0 {
            return self.remove(product_id, size.as_deref()).await;
        }

        if let Some(existing) = self.find_line(product_id).await? {
            let size = normalize_size(size);
            let mut active: CartActive = existing.into();
            active.quantity = Set(quantity);
            if size.is_some() {
                active.selected_size = Set(size);
            }
            active.update(self.conn).await?;
        }
        Ok(())
    }

    async fn remove(&mut self, product_id: i32, _size: Option<&str>) -> AppResult<()> {
        CartItems::delete_many()
            .filter(CartCol::UserId.eq(self.user_id))
            .filter(CartCol::ProductId.eq(product_id))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    async fn clear(&mut self) -> AppResult<()> {
        CartItems::delete_many()
            .filter(CartCol::UserId.eq(self.user_id))
            .exec(self.conn)
            .await?;
        Ok(())
    }
}

/// Browser-held cart. Lines are unique per (product, size).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestCart {
    lines: Vec<CartLine>,
}

impl GuestCart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a cart from client-supplied lines, dropping non-positive quantities
    /// and folding duplicate (product, size) pairs together.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            if line.quantity > 0 {
                cart.add_line(line.product_id, line.quantity, line.selected_size);
            }
        }
        cart
    }

    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    pub fn as_lines(&self) -> &[CartLine] {
        &self.lines
    }

    fn position(&self, product_id: i32, size: Option<&str>) -> Option<usize> {
        self.lines
            .iter()
            .position(|l| l.product_id == product_id && l.selected_size.as_deref() == size)
    }

    fn add_line(&mut self, product_id: i32, quantity: i32, size: Option<String>) {
        let size = normalize_size(size);
        match self.position(product_id, size.as_deref()) {
            Some(idx) => {
                let line = &mut self.lines[idx];
                line.quantity = line.quantity.saturating_add(quantity);
            }
            None => self.lines.push(CartLine::new(product_id, quantity, size)),
        }
    }
}

impl CartRepository for GuestCart {
    async fn lines(&self) -> AppResult<Vec<CartLine>> {
        Ok(self.lines.clone())
    }

    async fn add(
        &mut self,
        product_id: i32,
        quantity: i32,
        size: Option<String>,
    ) -> AppResult<()> {
        ensure_positive(quantity)?;
        self.add_line(product_id, quantity, size);
        Ok(())
    }

    async fn update_quantity(
        &mut self,
        product_id: i32,
        quantity: i32,
        size: Option<String>,
    ) -> AppResult<()> {
        let size = normalize_size(size);
        if quantity <= 0 {
            return self.remove(product_id, size.as_deref()).await;
        }
        if let Some(idx) = self.position(product_id, size.as_deref()) {
            self.lines[idx].quantity = quantity;
        }
        Ok(())
    }

    async fn remove(&mut self, product_id: i32, size: Option<&str>) -> AppResult<()> {
        let size = size.map(str::trim).filter(|s| !s.is_empty());
        self.lines
            .retain(|l| !(l.product_id == product_id && l.selected_size.as_deref() == size));
        Ok(())
    }

    async fn clear(&mut self) -> AppResult<()> {
        self.lines.clear();
        Ok(())
    }
}

/// Folds guest lines into `target`. Lines for a product already in the target
/// have their quantities summed. Callers run it once per login session.
pub async fn merge_on_login<R: CartRepository>(
    target: &mut R,
    guest_lines: Vec<CartLine>,
) -> AppResult<usize> {
    let guest = GuestCart::from_lines(guest_lines);
    let mut merged = 0;
    for line in guest.into_lines() {
        target
            .add(line.product_id, line.quantity, line.selected_size)
            .await?;
        merged += 1;
    }
    Ok(merged)
}

/// Joins lines with catalog data. Lines whose product is gone stay visible under
/// the unknown-item label and add nothing to the subtotal.
pub fn build_view(lines: Vec<CartLine>, products: &HashMap<i32, ProductModel>) -> CartView {
    let mut subtotal = Decimal::ZERO;
    let mut item_count = 0;
    let items = lines
        .into_iter()
        .map(|line| {
            item_count += line.quantity;
            match products.get(&line.product_id) {
                Some(product) => {
                    let unit_price = product.effective_price();
                    let line_total = unit_price * Decimal::from(line.quantity);
                    subtotal += line_total;
                    CartLineView {
                        product_id: line.product_id,
                        quantity: line.quantity,
                        selected_size: line.selected_size,
                        label: product.name.clone(),
                        product: Some(Product::from(product.clone())),
                        unit_price: Some(unit_price),
                        line_total,
                    }
                }
                None => CartLineView {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    selected_size: line.selected_size,
                    label: UNKNOWN_ITEM_LABEL.to_string(),
                    product: None,
                    unit_price: None,
                    line_total: Decimal::ZERO,
                },
            }
        })
        .collect();

    CartView {
        items,
        subtotal,
        item_count,
    }
}

pub async fn view_lines<C: ConnectionTrait>(conn: &C, lines: Vec<CartLine>) -> AppResult<CartView> {
    let ids: Vec<i32> = lines.iter().map(|l| l.product_id).collect();
    let products = find_products_by_ids(conn, &ids).await?;
    Ok(build_view(lines, &products))
}

async fn ensure_product_exists(state: &AppState, product_id: i32) -> AppResult<()> {
    let product = Products::find_by_id(product_id).one(&state.orm).await?;
    match product {
        Some(p) if p.is_active => Ok(()),
        _ => Err(AppError::BadRequest("product not found".to_string())),
    }
}

async fn user_cart_view(state: &AppState, user: &AuthUser) -> AppResult<CartView> {
    let cart = AuthenticatedCart::new(&state.orm, user.user_id);
    let lines = cart.lines().await?;
    view_lines(&state.orm, lines).await
}

fn cart_meta(view: &CartView) -> Meta {
    let total = view.items.len() as i64;
    Meta::single_page(total)
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let view = user_cart_view(state, user).await?;
    let meta = cart_meta(&view);
    Ok(ApiResponse::success("OK", view, Some(meta)))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    ensure_positive(payload.quantity)?;
    ensure_product_exists(state, payload.product_id).await?;

    let mut cart = AuthenticatedCart::new(&state.orm, user.user_id);
    cart.add(payload.product_id, payload.quantity, payload.selected_size)
        .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity }),
    )
    .await;

    let view = user_cart_view(state, user).await?;
    let meta = cart_meta(&view);
    Ok(ApiResponse::success("Added to cart", view, Some(meta)))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    product_id: i32,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartView>> {
    let mut cart = AuthenticatedCart::new(&state.orm, user.user_id);
    cart.update_quantity(product_id, payload.quantity, payload.selected_size)
        .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": product_id, "quantity": payload.quantity }),
    )
    .await;

    let view = user_cart_view(state, user).await?;
    let meta = cart_meta(&view);
    Ok(ApiResponse::success("Cart updated", view, Some(meta)))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: i32,
    size: Option<String>,
) -> AppResult<ApiResponse<CartView>> {
    let mut cart = AuthenticatedCart::new(&state.orm, user.user_id);
    cart.remove(product_id, size.as_deref()).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    let view = user_cart_view(state, user).await?;
    let meta = cart_meta(&view);
    Ok(ApiResponse::success("Removed from cart", view, Some(meta)))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let mut cart = AuthenticatedCart::new(&state.orm, user.user_id);
    cart.clear().await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Folds the guest cart into the account cart once per login session. The
/// session is claimed in `cart_merges` inside the same transaction as the
/// merge, so a repeated or concurrent call changes nothing. Lines for missing
/// or inactive products are dropped.
pub async fn merge_guest_cart(
    state: &AppState,
    user: &AuthUser,
    payload: MergeCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    if user.session_id.is_empty() {
        return Err(AppError::Unauthorized);
    }

    let txn = state.orm.begin().await?;

    let guest = GuestCart::from_lines(payload.lines).into_lines();
    let ids: Vec<i32> = guest.iter().map(|l| l.product_id).collect();
    let products = find_active_products_by_ids(&txn, &ids).await?;
    let (lines, dropped): (Vec<CartLine>, Vec<CartLine>) = guest
        .into_iter()
        .partition(|line| products.contains_key(&line.product_id));
    for line in &dropped {
        tracing::warn!(
            user_id = user.user_id,
            product_id = line.product_id,
            "guest cart line for missing or inactive product dropped during merge"
        );
    }

    let claim = CartMergeActive {
        user_id: Set(user.user_id),
        session_id: Set(user.session_id.clone()),
        merged_lines: Set(lines.len() as i32),
        created_at: NotSet,
    }
    .insert(&txn)
    .await;
    match claim {
        Ok(_) => {}
        Err(err) if is_unique_violation(&err) => {
            txn.rollback().await?;
            tracing::debug!(user_id = user.user_id, "guest cart already merged for this session");
            let view = user_cart_view(state, user).await?;
            let meta = cart_meta(&view);
            return Ok(ApiResponse::success("Cart already merged", view, Some(meta)));
        }
        Err(err) => return Err(err.into()),
    }

    let mut cart = AuthenticatedCart::new(&txn, user.user_id);
    let merged = merge_on_login(&mut cart, lines).await?;
    txn.commit().await?;
    tracing::debug!(user_id = user.user_id, merged, "guest cart merged");

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_merge",
        "cart_items",
        serde_json::json!({ "merged_lines": merged, "dropped_lines": dropped.len() }),
    )
    .await;

    let view = user_cart_view(state, user).await?;
    let meta = cart_meta(&view);
    Ok(ApiResponse::success("Cart merged", view, Some(meta)))
}

pub async fn guest_view(
    state: &AppState,
    lines: Vec<CartLine>,
) -> AppResult<ApiResponse<CartView>> {
    let cart = GuestCart::from_lines(lines);
    let view = view_lines(&state.orm, cart.into_lines()).await?;
    let meta = cart_meta(&view);
    Ok(ApiResponse::success("OK", view, Some(meta)))
}

pub async fn guest_add(
    state: &AppState,
    payload: GuestCartMutation,
) -> AppResult<ApiResponse<GuestCartLines>> {
    ensure_positive(payload.quantity)?;
    ensure_product_exists(state, payload.product_id).await?;

    let mut cart = GuestCart::from_lines(payload.lines);
    cart.add(payload.product_id, payload.quantity, payload.selected_size)
        .await?;
    Ok(ApiResponse::success(
        "Added to cart",
        GuestCartLines {
            lines: cart.into_lines(),
        },
        None,
    ))
}

pub async fn guest_update(payload: GuestCartMutation) -> AppResult<ApiResponse<GuestCartLines>> {
    let mut cart = GuestCart::from_lines(payload.lines);
    cart.update_quantity(payload.product_id, payload.quantity, payload.selected_size)
        .await?;
    Ok(ApiResponse::success(
        "Cart updated",
        GuestCartLines {
            lines: cart.into_lines(),
        },
        None,
    ))
}

pub async fn guest_remove(payload: GuestCartMutation) -> AppResult<ApiResponse<GuestCartLines>> {
    let mut cart = GuestCart::from_lines(payload.lines);
    cart.remove(payload.product_id, payload.selected_size.as_deref())
        .await?;
    Ok(ApiResponse::success(
        "Removed from cart",
        GuestCartLines {
            lines: cart.into_lines(),
        },
        None,
    ))
}
