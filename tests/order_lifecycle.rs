use std::collections::HashMap;

use rust_decimal::Decimal;
use storefront_api::{
    dto::orders::{GuestCheckoutRequest, GuestOrderLine},
    entity::{orders::Model as OrderModel, products::Model as ProductModel},
    error::AppError,
    models::{CartLine, OrderStatus, ProductCategory, ShippingAddress},
    services::order_service::{
        DEFAULT_GUEST_SIZE, ensure_same_submitter, guest_lines, snapshot_lines, snapshot_total,
        validate_shipping,
    },
};

fn shipping(name: &str) -> ShippingAddress {
    ShippingAddress {
        name: name.into(),
        address: "12 Rue des Fleurs".into(),
        city: "Casablanca".into(),
        phone: "+212600000000".into(),
    }
}

fn guest_request(items: Vec<GuestOrderLine>, product_ids: Vec<i32>) -> GuestCheckoutRequest {
    GuestCheckoutRequest {
        items,
        product_ids,
        shipping: shipping("Amine Tazi"),
        contact_email: None,
        total_amount: Decimal::ZERO,
        idempotency_key: None,
    }
}

#[test]
fn nominal_lifecycle_moves_forward_only() {
    use OrderStatus::*;
    assert!(Pending.can_transition_to(Confirmed));
    assert!(Confirmed.can_transition_to(Shipped));
    assert!(Shipped.can_transition_to(Delivered));
    assert!(Pending.can_transition_to(Cancelled));
    assert!(Shipped.can_transition_to(Cancelled));

    assert!(!Pending.can_transition_to(Delivered));
    assert!(!Delivered.can_transition_to(Cancelled));
    assert!(!Cancelled.can_transition_to(Pending));
    assert!(Delivered.is_terminal());
}

#[test]
fn status_parses_case_insensitively() {
    assert_eq!("Shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
    assert_eq!(" cancelled ".parse::<OrderStatus>(), Ok(OrderStatus::Cancelled));
    assert!("lost".parse::<OrderStatus>().is_err());
    assert_eq!(OrderStatus::Confirmed.as_str(), "confirmed");
}

#[test]
fn guest_lines_apply_defaults_and_fold_duplicates() -> anyhow::Result<()> {
    let request = guest_request(
        vec![
            GuestOrderLine {
                product_id: 7,
                quantity: Some(2),
                selected_size: Some("50ml".into()),
            },
            GuestOrderLine {
                product_id: 9,
                quantity: None,
                selected_size: None,
            },
        ],
        vec![9],
    );

    let lines = guest_lines(&request)?;
    assert_eq!(
        lines,
        vec![
            CartLine::new(7, 2, Some("50ml".into())),
            CartLine::new(9, 2, Some(DEFAULT_GUEST_SIZE.into())),
        ]
    );
    Ok(())
}

#[test]
fn guest_lines_reject_zero_quantity() {
    let request = guest_request(
        vec![GuestOrderLine {
            product_id: 7,
            quantity: Some(0),
            selected_size: None,
        }],
        Vec::new(),
    );
    assert!(matches!(guest_lines(&request), Err(AppError::InvalidQuantity(0))));
}

#[test]
fn snapshot_skips_unresolved_products_and_uses_discount_price() {
    let mut products = HashMap::new();
    products.insert(
        7,
        ProductModel {
            id: 7,
            name: "Oud Royal".into(),
            description: None,
            category: ProductCategory::Men,
            price: Decimal::from(90),
            discount_price: Some(Decimal::from(50)),
            image: None,
            images: Vec::new(),
            sizes: Vec::new(),
            notes: None,
            stock: 5,
            is_active: true,
            created_at: chrono::Utc::now().into(),
        },
    );

    let lines = vec![CartLine::new(7, 2, Some("50ml".into())), CartLine::new(404, 1, None)];
    let snapshot = snapshot_lines(&lines, &products);

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].product_name, "Oud Royal");
    assert_eq!(snapshot[0].unit_price, Decimal::from(50));
    assert_eq!(snapshot_total(&snapshot), Decimal::from(100));
}

#[test]
fn shipping_fields_are_trimmed_and_required() -> anyhow::Result<()> {
    let cleaned = validate_shipping(shipping("  Amine Tazi "))?;
    assert_eq!(cleaned.name, "Amine Tazi");

    let mut missing_city = shipping("Amine Tazi");
    missing_city.city = "   ".into();
    assert!(matches!(validate_shipping(missing_city), Err(AppError::BadRequest(_))));
    Ok(())
}

fn stored_order(user_id: Option<i32>) -> OrderModel {
    let now = chrono::Utc::now().into();
    OrderModel {
        id: 1,
        user_id,
        order_number: "ORD-20240101120000-ABCDEF".into(),
        total_amount: Decimal::from(50),
        status: OrderStatus::Pending,
        shipping_address: shipping("Amine Tazi"),
        contact_email: None,
        idempotency_key: Some("key-1".into()),
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn replay_is_limited_to_the_original_submitter() {
    let guest_order = stored_order(None);
    assert!(ensure_same_submitter(&guest_order, None, &shipping("Amine Tazi")).is_ok());

    let mut other_phone = shipping("Amine Tazi");
    other_phone.phone = "+212611111111".into();
    assert!(matches!(
        ensure_same_submitter(&guest_order, None, &other_phone),
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        ensure_same_submitter(&guest_order, Some(3), &shipping("Amine Tazi")),
        Err(AppError::Conflict(_))
    ));

    let account_order = stored_order(Some(3));
    assert!(ensure_same_submitter(&account_order, Some(3), &other_phone).is_ok());
    assert!(matches!(
        ensure_same_submitter(&account_order, Some(4), &shipping("Amine Tazi")),
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        ensure_same_submitter(&account_order, None, &shipping("Amine Tazi")),
        Err(AppError::Conflict(_))
    ));
}
