use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::orders::{
        AddOrderItemRequest, CheckoutRequest, GuestCheckoutRequest, OrderItemList, OrderList,
        OrderWithItems, UpdateOrderStatusRequest,
    },
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::{AuthUser, ensure_admin},
    models::{CartLine, Order, OrderItem, OrderStatus, ShippingAddress},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        cart_service::{AuthenticatedCart, CartRepository, GuestCart},
        product_service::{find_active_products_by_ids, find_products_by_ids},
    },
    state::AppState,
};

/// Size recorded for guest lines submitted without one.
pub const DEFAULT_GUEST_SIZE: &str = "default";

const ORDER_NUMBER_PREFIX: &str = "ORD";
const ORDER_NUMBER_SUFFIX_LEN: usize = 6;
const ORDER_NUMBER_ATTEMPTS: usize = 5;
// No 0/O or 1/I, so numbers survive being read out over the phone.
const ORDER_NUMBER_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Where the lines of a checkout come from.
#[derive(Debug, Clone)]
pub enum OrderSource {
    /// The user's server-persisted cart, cleared once the order is written.
    Authenticated { user_id: i32 },
    /// Lines submitted by a browser without an account.
    Guest { lines: Vec<CartLine> },
}

impl OrderSource {
    fn user_id(&self) -> Option<i32> {
        match self {
            OrderSource::Authenticated { user_id } => Some(*user_id),
            OrderSource::Guest { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub source: OrderSource,
    pub shipping: ShippingAddress,
    pub contact_email: Option<String>,
    pub total_amount: Decimal,
    pub idempotency_key: Option<String>,
}

#[derive(Debug)]
pub struct PlacedOrder {
    pub order: OrderWithItems,
    /// True when an earlier order with the same idempotency key was returned.
    pub replayed: bool,
}

/// `ORD-<yyyymmddHHMMSS>-<6 random characters>`.
pub fn generate_order_number() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ORDER_NUMBER_CHARSET.len());
            ORDER_NUMBER_CHARSET[idx] as char
        })
        .collect();
    format!(
        "{}-{}-{}",
        ORDER_NUMBER_PREFIX,
        Utc::now().format("%Y%m%d%H%M%S"),
        suffix
    )
}

async fn unique_order_number<C: ConnectionTrait>(conn: &C) -> AppResult<String> {
    for _ in 0..ORDER_NUMBER_ATTEMPTS {
        let candidate = generate_order_number();
        let taken = Orders::find()
            .filter(OrderCol::OrderNumber.eq(candidate.as_str()))
            .count(conn)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
        tracing::debug!(order_number = %candidate, "order number collision, retrying");
    }
    Err(AppError::Internal(anyhow::anyhow!(
        "could not allocate a unique order number"
    )))
}

pub fn validate_shipping(shipping: ShippingAddress) -> AppResult<ShippingAddress> {
    let ShippingAddress {
        name,
        address,
        city,
        phone,
    } = shipping;
    let fields = [
        ("name", name.trim()),
        ("address", address.trim()),
        ("city", city.trim()),
        ("phone", phone.trim()),
    ];
    if let Some((field, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
        return Err(AppError::BadRequest(format!("shipping {field} is required")));
    }
    Ok(ShippingAddress {
        name: name.trim().to_string(),
        address: address.trim().to_string(),
        city: city.trim().to_string(),
        phone: phone.trim().to_string(),
    })
}

fn validate_contact_email(email: Option<String>) -> AppResult<Option<String>> {
    let email = email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
    if let Some(email) = email.as_deref() {
        let valid = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            return Err(AppError::BadRequest("invalid contact email".into()));
        }
    }
    Ok(email)
}

/// Turns the guest request into cart lines: quantity defaults to 1 and size to
/// [`DEFAULT_GUEST_SIZE`]. Duplicate (product, size) pairs are folded together.
pub fn guest_lines(payload: &GuestCheckoutRequest) -> AppResult<Vec<CartLine>> {
    let mut lines = Vec::with_capacity(payload.items.len() + payload.product_ids.len());
    for item in &payload.items {
        let quantity = item.quantity.unwrap_or(1);
        if quantity < 1 {
            return Err(AppError::InvalidQuantity(quantity));
        }
        let size = item
            .selected_size
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_GUEST_SIZE);
        lines.push(CartLine::new(item.product_id, quantity, Some(size.to_string())));
    }
    for product_id in &payload.product_ids {
        lines.push(CartLine::new(
            *product_id,
            1,
            Some(DEFAULT_GUEST_SIZE.to_string()),
        ));
    }
    Ok(GuestCart::from_lines(lines).into_lines())
}

/// A line whose product resolved, priced at the moment of checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotLine {
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub selected_size: Option<String>,
}

/// Freezes unit prices from the current catalog. Lines whose product is not in
/// `products` (deleted or deactivated) are skipped and logged.
pub fn snapshot_lines(
    lines: &[CartLine],
    products: &HashMap<i32, ProductModel>,
) -> Vec<SnapshotLine> {
    lines
        .iter()
        .filter_map(|line| match products.get(&line.product_id) {
            Some(product) => Some(SnapshotLine {
                product_id: product.id,
                product_name: product.name.clone(),
                quantity: line.quantity,
                unit_price: product.effective_price(),
                selected_size: line.selected_size.clone(),
            }),
            None => {
                tracing::warn!(
                    product_id = line.product_id,
                    quantity = line.quantity,
                    "product missing or inactive while snapshotting order, skipping line"
                );
                None
            }
        })
        .collect()
}

pub fn snapshot_total(lines: &[SnapshotLine]) -> Decimal {
    lines
        .iter()
        .map(|l| l.unit_price * Decimal::from(l.quantity))
        .sum()
}

/// Compares the caller's total with the snapshot. Mismatches are logged, and
/// rejected when `strict` is set.
pub fn check_total(
    submitted: Decimal,
    computed: Decimal,
    tolerance: Decimal,
    strict: bool,
) -> AppResult<()> {
    if submitted.is_sign_negative() {
        return Err(AppError::BadRequest("total amount must not be negative".into()));
    }
    let diff = (submitted - computed).abs();
    if diff > tolerance {
        tracing::warn!(
            submitted = %submitted,
            computed = %computed,
            "order total differs from snapshotted line prices"
        );
        if strict {
            return Err(AppError::BadRequest(format!(
                "total amount {submitted} does not match item total {computed}"
            )));
        }
    }
    Ok(())
}

async fn find_by_idempotency_key<C: ConnectionTrait>(
    conn: &C,
    key: &str,
) -> AppResult<Option<OrderModel>> {
    let existing = Orders::find()
        .filter(OrderCol::IdempotencyKey.eq(key))
        .one(conn)
        .await?;
    Ok(existing)
}

/// A key may only replay an order for whoever placed it: the same account, or
/// for guest orders the same shipping phone. Anyone else gets a conflict and
/// never sees the stored order.
pub fn ensure_same_submitter(
    existing: &OrderModel,
    user_id: Option<i32>,
    shipping: &ShippingAddress,
) -> AppResult<()> {
    let same_owner = existing.user_id == user_id;
    let same_guest = user_id.is_some() || existing.shipping_address.phone == shipping.phone;
    if same_owner && same_guest {
        return Ok(());
    }
    tracing::warn!(
        order_id = existing.id,
        caller = ?user_id,
        "idempotency key reused by a different submitter"
    );
    Err(AppError::Conflict(
        "idempotency key already used for another order".into(),
    ))
}

async fn replay<C: ConnectionTrait>(
    conn: &C,
    existing: OrderModel,
    user_id: Option<i32>,
    shipping: &ShippingAddress,
) -> AppResult<PlacedOrder> {
    ensure_same_submitter(&existing, user_id, shipping)?;
    tracing::info!(
        order_number = %existing.order_number,
        "duplicate checkout submission, returning existing order"
    );
    Ok(PlacedOrder {
        order: with_items(conn, existing).await?,
        replayed: true,
    })
}

/// Writes one order and its items. Header, items and cart clearing share a
/// transaction; the notification is dispatched only after commit.
pub async fn place_order(state: &AppState, new_order: NewOrder) -> AppResult<PlacedOrder> {
    let NewOrder {
        source,
        shipping,
        contact_email,
        total_amount,
        idempotency_key,
    } = new_order;

    let shipping = validate_shipping(shipping)?;
    let contact_email = validate_contact_email(contact_email)?;
    let idempotency_key = idempotency_key
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());

    let user_id = source.user_id();
    if let Some(key) = idempotency_key.as_deref() {
        if let Some(existing) = find_by_idempotency_key(&state.orm, key).await? {
            return replay(&state.orm, existing, user_id, &shipping).await;
        }
    }

    let txn = state.orm.begin().await?;

    let lines = match &source {
        OrderSource::Authenticated { user_id } => {
            AuthenticatedCart::new(&txn, *user_id).lines().await?
        }
        OrderSource::Guest { lines } => lines.clone(),
    };
    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }
    if let Some(line) = lines.iter().find(|l| l.quantity < 1) {
        return Err(AppError::InvalidQuantity(line.quantity));
    }

    let ids: Vec<i32> = lines.iter().map(|l| l.product_id).collect();
    let products = find_active_products_by_ids(&txn, &ids).await?;
    let snapshot = snapshot_lines(&lines, &products);
    if snapshot.is_empty() {
        return Err(AppError::BadRequest(
            "none of the ordered products are available".into(),
        ));
    }

    let checkout = &state.config.checkout;
    check_total(
        total_amount,
        snapshot_total(&snapshot),
        checkout.total_tolerance,
        checkout.strict_totals,
    )?;

    let order_number = unique_order_number(&txn).await?;

    let inserted = OrderActive {
        id: NotSet,
        user_id: Set(user_id),
        order_number: Set(order_number),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending),
        shipping_address: Set(shipping.clone()),
        contact_email: Set(contact_email),
        idempotency_key: Set(idempotency_key.clone()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await;

    let order = match inserted {
        Ok(order) => order,
        Err(err) if is_unique_violation(&err) && idempotency_key.is_some() => {
            // A concurrent submission with the same key won the race.
            txn.rollback().await?;
            let key = idempotency_key.as_deref().unwrap_or_default();
            return match find_by_idempotency_key(&state.orm, key).await? {
                Some(existing) => replay(&state.orm, existing, user_id, &shipping).await,
                None => Err(AppError::from(err)),
            };
        }
        Err(err) => return Err(err.into()),
    };

    let mut items = Vec::with_capacity(snapshot.len());
    for line in snapshot {
        let item = OrderItemActive {
            id: NotSet,
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            selected_size: Set(line.selected_size),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(OrderItem::from_entity(item, Some(line.product_name)));
    }

    if let OrderSource::Authenticated { user_id } = &source {
        AuthenticatedCart::new(&txn, *user_id).clear().await?;
    }

    txn.commit().await?;

    let order = Order::from(order);
    tracing::info!(
        order_id = order.id,
        order_number = %order.order_number,
        guest = order.is_guest,
        items = items.len(),
        "order created"
    );

    audit::record(
        &state.pool,
        user_id,
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "order_number": order.order_number }),
    )
    .await;

    state.notifier.dispatch(order.clone(), items.clone());

    Ok(PlacedOrder {
        order: OrderWithItems { order, items },
        replayed: false,
    })
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let placed = place_order(
        state,
        NewOrder {
            source: OrderSource::Authenticated {
                user_id: user.user_id,
            },
            shipping: payload.shipping,
            contact_email: payload.contact_email,
            total_amount: payload.total_amount,
            idempotency_key: payload.idempotency_key,
        },
    )
    .await?;
    Ok(placed_response(placed))
}

pub async fn checkout_guest(
    state: &AppState,
    payload: GuestCheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let lines = guest_lines(&payload)?;
    let placed = place_order(
        state,
        NewOrder {
            source: OrderSource::Guest { lines },
            shipping: payload.shipping,
            contact_email: payload.contact_email,
            total_amount: payload.total_amount,
            idempotency_key: payload.idempotency_key,
        },
    )
    .await?;
    Ok(placed_response(placed))
}

fn placed_response(placed: PlacedOrder) -> ApiResponse<OrderWithItems> {
    let message = if placed.replayed {
        "Order already placed"
    } else {
        "Order placed"
    };
    ApiResponse::success(message, placed.order, Some(Meta::empty()))
}

pub async fn list_user_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Loads an order the caller may see: their own, or any order for an admin.
async fn find_visible_order(state: &AppState, user: &AuthUser, id: i32) -> AppResult<OrderModel> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    match order {
        Some(o) if user.is_admin() || o.user_id == Some(user.user_id) => Ok(o),
        _ => Err(AppError::NotFound),
    }
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_visible_order(state, user, id).await?;
    let data = with_items(&state.orm, order).await?;
    Ok(ApiResponse::ok(data))
}

pub async fn get_order_items(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<OrderItemList>> {
    let order = find_visible_order(state, user, id).await?;
    let items = load_items(&state.orm, order.id).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        OrderItemList { items },
        Some(Meta::single_page(total)),
    ))
}

/// Public tracking lookup for guests; same shape as [`get_order`].
pub async fn get_order_by_number(
    state: &AppState,
    order_number: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(OrderCol::OrderNumber.eq(order_number.trim().to_uppercase()))
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    let data = with_items(&state.orm, order).await?;
    Ok(ApiResponse::ok(data))
}

/// Admin override: any status may be set from any status.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let previous = existing.status;
    let next = payload.status;
    if previous != next && !previous.can_transition_to(next) {
        tracing::warn!(
            order_id = id,
            from = previous.as_str(),
            to = next.as_str(),
            "admin override outside the nominal order lifecycle"
        );
    }

    let mut active: OrderActive = existing.into();
    active.status = Set(next);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": previous.as_str(), "to": next.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    OrderItems::delete_many()
        .filter(OrderItemCol::OrderId.eq(id))
        .exec(&txn)
        .await?;
    let result = Orders::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(AppError::NotFound);
    }
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Admin correction on a pending order: the new item is priced from the catalog
/// now and its line total is added to the order total.
pub async fn add_order_item(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: AddOrderItemRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    if payload.quantity < 1 {
        return Err(AppError::InvalidQuantity(payload.quantity));
    }

    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id).one(&txn).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    if order.status != OrderStatus::Pending {
        return Err(AppError::BadRequest(
            "items can only be added to pending orders".into(),
        ));
    }

    let product = Products::find_by_id(payload.product_id).one(&txn).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::BadRequest("product not found".into())),
    };

    let unit_price = product.effective_price();
    OrderItemActive {
        id: NotSet,
        order_id: Set(order.id),
        product_id: Set(product.id),
        quantity: Set(payload.quantity),
        unit_price: Set(unit_price),
        selected_size: Set(payload
            .selected_size
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let new_total = order.total_amount + unit_price * Decimal::from(payload.quantity);
    let mut active: OrderActive = order.into();
    active.total_amount = Set(new_total);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_item_add",
        "order_items",
        serde_json::json!({ "order_id": order.id, "product_id": product.id }),
    )
    .await;

    let data = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("Item added", data, Some(Meta::empty())))
}

pub async fn with_items<C: ConnectionTrait>(conn: &C, order: OrderModel) -> AppResult<OrderWithItems> {
    let items = load_items(conn, order.id).await?;
    Ok(OrderWithItems {
        order: Order::from(order),
        items,
    })
}

/// Items of one order with current product names; deleted products show the
/// unknown-item label while keeping their snapshotted price.
pub async fn load_items<C: ConnectionTrait>(conn: &C, order_id: i32) -> AppResult<Vec<OrderItem>> {
    let rows: Vec<OrderItemModel> = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::Id)
        .all(conn)
        .await?;

    let ids: Vec<i32> = rows.iter().map(|r| r.product_id).collect();
    let products = find_products_by_ids(conn, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let name = products.get(&row.product_id).map(|p| p.name.clone());
            OrderItem::from_entity(row, name)
        })
        .collect())
}
