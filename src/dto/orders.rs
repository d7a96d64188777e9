use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, OrderItem, OrderStatus, ShippingAddress};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub shipping: ShippingAddress,
    pub contact_email: Option<String>,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GuestCheckoutRequest {
    #[serde(default)]
    pub items: Vec<GuestOrderLine>,
    /// Plain id list accepted for clients that only track product ids.
    #[serde(default)]
    pub product_ids: Vec<i32>,
    pub shipping: ShippingAddress,
    pub contact_email: Option<String>,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GuestOrderLine {
    pub product_id: i32,
    pub quantity: Option<i32>,
    pub selected_size: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddOrderItemRequest {
    pub product_id: i32,
    pub quantity: i32,
    pub selected_size: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemList {
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStats {
    pub total_orders: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub shipped: i64,
    pub delivered: i64,
    pub cancelled: i64,
    #[schema(value_type = String)]
    pub revenue: Decimal,
}
