use chrono::Utc;
use rust_decimal::Decimal;
use storefront_api::{
    config::NotifyConfig,
    models::{Order, OrderItem, OrderStatus, ShippingAddress},
    services::notification_service::{NotifyOutcome, Notifier, format_order_message},
};

fn sample_order() -> (Order, Vec<OrderItem>) {
    let now = Utc::now();
    let order = Order {
        id: 1,
        user_id: None,
        is_guest: true,
        order_number: "ORD-20240101120000-ABCDEF".into(),
        total_amount: Decimal::from(150),
        status: OrderStatus::Pending,
        shipping_address: ShippingAddress {
            name: "Amine Tazi".into(),
            address: "12 Rue des Fleurs".into(),
            city: "Casablanca".into(),
            phone: "+212600000000".into(),
        },
        contact_email: Some("amine@example.com".into()),
        created_at: now,
        updated_at: now,
    };
    let items = vec![
        OrderItem {
            id: 1,
            order_id: 1,
            product_id: 7,
            product_name: "Oud Royal".into(),
            quantity: 2,
            unit_price: Decimal::from(50),
            selected_size: Some("50ml".into()),
            created_at: now,
        },
        OrderItem {
            id: 2,
            order_id: 1,
            product_id: 9,
            product_name: "Citrus Breeze".into(),
            quantity: 1,
            unit_price: Decimal::from(50),
            selected_size: None,
            created_at: now,
        },
    ];
    (order, items)
}

#[test]
fn message_lists_customer_items_and_total() {
    let (order, items) = sample_order();
    let message = format_order_message(&order, &items);

    assert!(message.starts_with("New order ORD-20240101120000-ABCDEF"));
    assert!(message.contains("Customer: Amine Tazi"));
    assert!(message.contains("City: Casablanca"));
    assert!(message.contains("Email: amine@example.com"));
    assert!(message.contains("- 2 x Oud Royal [50ml] @ 50"));
    assert!(message.contains("- 1 x Citrus Breeze @ 50"));
    assert!(message.ends_with("Total: 150"));
}

#[test]
fn message_omits_missing_email() {
    let (mut order, items) = sample_order();
    order.contact_email = None;
    assert!(!format_order_message(&order, &items).contains("Email:"));
}

#[tokio::test]
async fn unconfigured_notifier_logs_locally() {
    let notifier = Notifier::new(NotifyConfig::default());
    assert!(!notifier.is_configured());

    let (order, items) = sample_order();
    assert_eq!(notifier.notify(&order, &items).await, NotifyOutcome::LoggedLocally);
}

#[tokio::test]
async fn key_without_phone_is_not_configured() {
    let notifier = Notifier::new(NotifyConfig {
        api_url: "http://127.0.0.1:9".into(),
        api_key: Some("key".into()),
        admin_phone: None,
    });
    assert!(!notifier.is_configured());

    let (order, items) = sample_order();
    assert_eq!(notifier.notify(&order, &items).await, NotifyOutcome::LoggedLocally);
}
