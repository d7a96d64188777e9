use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{cart_items, order_items, orders, products, users};

pub use crate::entity::types::{FragranceNotes, OrderStatus, ProductCategory, ShippingAddress};

/// Label shown for cart lines and order items whose product no longer resolves.
pub const UNKNOWN_ITEM_LABEL: &str = "Unknown item";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            phone: model.phone,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: ProductCategory,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[schema(value_type = Option<String>)]
    pub discount_price: Option<Decimal>,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub notes: Option<FragranceNotes>,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            category: model.category,
            price: model.price,
            discount_price: model.discount_price,
            image: model.image,
            images: model.images,
            sizes: model.sizes,
            notes: model.notes,
            stock: model.stock,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// One cart line, in either the server-persisted or the guest representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: i32,
    pub quantity: i32,
    #[serde(default)]
    pub selected_size: Option<String>,
}

impl CartLine {
    pub fn new(product_id: i32, quantity: i32, selected_size: Option<String>) -> Self {
        Self {
            product_id,
            quantity,
            selected_size,
        }
    }
}

impl From<cart_items::Model> for CartLine {
    fn from(model: cart_items::Model) -> Self {
        Self {
            product_id: model.product_id,
            quantity: model.quantity,
            selected_size: model.selected_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: i32,
    pub user_id: Option<i32>,
    pub is_guest: bool,
    pub order_number: String,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub contact_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            is_guest: model.user_id.is_none(),
            order_number: model.order_number,
            total_amount: model.total_amount,
            status: model.status,
            shipping_address: model.shipping_address,
            contact_email: model.contact_email,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    /// Current catalog name, or the unknown-item label once the product is gone.
    pub product_name: String,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    pub selected_size: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn from_entity(model: order_items::Model, product_name: Option<String>) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name: product_name.unwrap_or_else(|| UNKNOWN_ITEM_LABEL.to_string()),
            quantity: model.quantity,
            unit_price: model.unit_price,
            selected_size: model.selected_size,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
