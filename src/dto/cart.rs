use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CartLine, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: i32,
    pub quantity: i32,
    pub selected_size: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
    pub selected_size: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveCartItemQuery {
    pub size: Option<String>,
}

/// Guest cart lines as they live in browser storage.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GuestCartRequest {
    #[serde(default)]
    pub lines: Vec<CartLine>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GuestCartMutation {
    #[serde(default)]
    pub lines: Vec<CartLine>,
    pub product_id: i32,
    #[serde(default)]
    pub quantity: i32,
    pub selected_size: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GuestCartLines {
    pub lines: Vec<CartLine>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MergeCartRequest {
    pub lines: Vec<CartLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    pub item_count: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineView {
    pub product_id: i32,
    pub quantity: i32,
    pub selected_size: Option<String>,
    /// Product name, or the unknown-item label when the product cannot be resolved.
    pub label: String,
    pub product: Option<Product>,
    #[schema(value_type = Option<String>)]
    pub unit_price: Option<Decimal>,
    #[schema(value_type = String)]
    pub line_total: Decimal,
}
