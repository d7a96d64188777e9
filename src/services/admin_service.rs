use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::{
    dto::orders::{OrderList, OrderStats},
    entity::orders::{Column as OrderCol, Entity as Orders},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
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

    Ok(ApiResponse::success("Orders", OrderList { items: orders }, Some(meta)))
}

/// Order counts per status and revenue over every order that was not cancelled.
pub async fn order_stats(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderStats>> {
    ensure_admin(user)?;

    let counts: Vec<(OrderStatus, i64)> = Orders::find()
        .select_only()
        .column(OrderCol::Status)
        .column_as(OrderCol::Id.count(), "count")
        .group_by(OrderCol::Status)
        .into_tuple()
        .all(&state.orm)
        .await?;

    let revenue: Option<Option<Decimal>> = Orders::find()
        .select_only()
        .column_as(OrderCol::TotalAmount.sum(), "revenue")
        .filter(OrderCol::Status.ne(OrderStatus::Cancelled))
        .into_tuple()
        .one(&state.orm)
        .await?;

    let mut stats = OrderStats {
        total_orders: 0,
        pending: 0,
        confirmed: 0,
        shipped: 0,
        delivered: 0,
        cancelled: 0,
        revenue: revenue.flatten().unwrap_or(Decimal::ZERO),
    };
    for (status, count) in counts {
        stats.total_orders += count;
        match status {
            OrderStatus::Pending => stats.pending = count,
            OrderStatus::Confirmed => stats.confirmed = count,
            OrderStatus::Shipped => stats.shipped = count,
            OrderStatus::Delivered => stats.delivered = count,
            OrderStatus::Cancelled => stats.cancelled = count,
        }
    }

    Ok(ApiResponse::success("Stats", stats, Some(Meta::empty())))
}
