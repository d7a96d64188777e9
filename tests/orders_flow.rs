use std::collections::HashSet;

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use storefront_api::{
    config::{AppConfig, CheckoutConfig, NotifyConfig},
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        cart::{AddToCartRequest, MergeCartRequest, UpdateCartItemRequest},
        orders::{
            AddOrderItemRequest, CheckoutRequest, GuestCheckoutRequest, GuestOrderLine,
            UpdateOrderStatusRequest,
        },
        products::UpdateProductRequest,
    },
    entity::{
        products::{ActiveModel as ProductActive, Model as ProductModel},
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::AppError,
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_USER},
    models::{CartLine, OrderStatus, ProductCategory, ShippingAddress},
    services::{admin_service, cart_service, order_service, product_service},
    state::AppState,
};
use uuid::Uuid;

// Storefront flows against a real database: guest and account checkout, price
// snapshots, idempotent submission, cart merging and admin order management.
#[tokio::test]
async fn storefront_checkout_and_admin_flows() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let customer = create_user(&state, ROLE_USER).await?;
    let other = create_user(&state, ROLE_USER).await?;
    let admin = create_user(&state, ROLE_ADMIN).await?;

    let oud = create_product(&state, "Oud", 50).await?;
    let citrus = create_product(&state, "Citrus", 50).await?;

    guest_checkout_snapshots_prices(&state, &admin, &oud, &citrus).await?;
    account_checkout_empties_cart(&state, &customer, &oud).await?;
    failed_checkout_keeps_cart(&state, &customer, &citrus).await?;
    duplicate_submission_returns_first_order(&state, &citrus).await?;
    concurrent_orders_get_distinct_numbers(&state, &oud).await?;
    order_management_requires_admin(&state, &customer, &other, &admin, &oud).await?;
    idempotency_key_is_scoped_to_submitter(&state, &customer, &other, &citrus).await?;
    account_cart_updates_and_merges(&state, &customer, &admin, &oud, &citrus).await?;
    rejected_total_rolls_back_checkout(&state, &customer, &citrus).await?;
    inactive_products_are_not_ordered(&state, &admin, &citrus).await?;
    product_rename_is_validated(&state, &admin, &citrus).await?;

    // Orders keep their owner: a user with orders cannot be deleted.
    let deleted = Users::delete_by_id(customer.user_id).exec(&state.orm).await;
    assert!(deleted.is_err());

    let stats = admin_service::order_stats(&state, &admin)
        .await?
        .data
        .expect("stats");
    assert!(stats.total_orders >= 8);
    assert!(stats.revenue > Decimal::ZERO);

    Ok(())
}

async fn guest_checkout_snapshots_prices(
    state: &AppState,
    admin: &AuthUser,
    oud: &ProductModel,
    citrus: &ProductModel,
) -> anyhow::Result<()> {
    let placed = order_service::checkout_guest(
        state,
        GuestCheckoutRequest {
            items: vec![
                GuestOrderLine {
                    product_id: oud.id,
                    quantity: Some(2),
                    selected_size: Some("50ml".into()),
                },
                GuestOrderLine {
                    product_id: citrus.id,
                    quantity: Some(1),
                    selected_size: None,
                },
            ],
            product_ids: Vec::new(),
            shipping: shipping("Amine Tazi"),
            contact_email: Some("amine@example.com".into()),
            total_amount: Decimal::from(150),
            idempotency_key: None,
        },
    )
    .await?
    .data
    .expect("order");

    assert!(placed.order.is_guest);
    assert_eq!(placed.order.user_id, None);
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.total_amount, Decimal::from(150));
    assert_eq!(placed.order.shipping_address.name, "Amine Tazi");
    assert!(placed.order.order_number.starts_with("ORD-"));
    assert_eq!(placed.items.len(), 2);

    product_service::update_product(
        state,
        admin,
        oud.id,
        UpdateProductRequest {
            price: Some(Decimal::from(80)),
            ..Default::default()
        },
    )
    .await?;

    let tracked = order_service::get_order_by_number(
        state,
        &placed.order.order_number.to_lowercase(),
    )
    .await?
    .data
    .expect("tracked order");
    let by_id = order_service::get_order(state, admin, placed.order.id)
        .await?
        .data
        .expect("order by id");

    assert_eq!(tracked.order, by_id.order);
    assert_eq!(tracked.items, by_id.items);

    let oud_line = tracked
        .items
        .iter()
        .find(|item| item.product_id == oud.id)
        .expect("oud line");
    assert_eq!(oud_line.unit_price, Decimal::from(50));
    assert_eq!(oud_line.selected_size.as_deref(), Some("50ml"));

    let citrus_line = tracked
        .items
        .iter()
        .find(|item| item.product_id == citrus.id)
        .expect("citrus line");
    assert_eq!(
        citrus_line.selected_size.as_deref(),
        Some(order_service::DEFAULT_GUEST_SIZE)
    );

    // Restore the catalog price for the remaining flows.
    product_service::update_product(
        state,
        admin,
        oud.id,
        UpdateProductRequest {
            price: Some(Decimal::from(50)),
            ..Default::default()
        },
    )
    .await?;
    Ok(())
}

async fn account_checkout_empties_cart(
    state: &AppState,
    customer: &AuthUser,
    oud: &ProductModel,
) -> anyhow::Result<()> {
    let invalid = cart_service::add_to_cart(
        state,
        customer,
        AddToCartRequest {
            product_id: oud.id,
            quantity: 0,
            selected_size: None,
        },
    )
    .await;
    assert!(matches!(invalid, Err(AppError::InvalidQuantity(0))));

    for _ in 0..2 {
        cart_service::add_to_cart(
            state,
            customer,
            AddToCartRequest {
                product_id: oud.id,
                quantity: 1,
                selected_size: Some("100ml".into()),
            },
        )
        .await?;
    }

    let cart = cart_service::get_cart(state, customer)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.subtotal, Decimal::from(100));

    let placed = order_service::checkout(
        state,
        customer,
        CheckoutRequest {
            shipping: shipping("Sara Idrissi"),
            contact_email: None,
            total_amount: Decimal::from(100),
            idempotency_key: None,
        },
    )
    .await?
    .data
    .expect("order");

    assert_eq!(placed.order.user_id, Some(customer.user_id));
    assert!(!placed.order.is_guest);
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].quantity, 2);

    let cart = cart_service::get_cart(state, customer)
        .await?
        .data
        .expect("cart");
    assert!(cart.items.is_empty());

    // Removing a line that is not there still answers with the cart.
    let after_remove = cart_service::remove_from_cart(state, customer, oud.id, None)
        .await?
        .data
        .expect("cart");
    assert!(after_remove.items.is_empty());

    let empty = order_service::checkout(
        state,
        customer,
        CheckoutRequest {
            shipping: shipping("Sara Idrissi"),
            contact_email: None,
            total_amount: Decimal::ZERO,
            idempotency_key: None,
        },
    )
    .await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));
    Ok(())
}

async fn failed_checkout_keeps_cart(
    state: &AppState,
    customer: &AuthUser,
    citrus: &ProductModel,
) -> anyhow::Result<()> {
    cart_service::add_to_cart(
        state,
        customer,
        AddToCartRequest {
            product_id: citrus.id,
            quantity: 3,
            selected_size: None,
        },
    )
    .await?;

    let failed = order_service::checkout(
        state,
        customer,
        CheckoutRequest {
            shipping: shipping("  "),
            contact_email: None,
            total_amount: Decimal::from(150),
            idempotency_key: None,
        },
    )
    .await;
    assert!(matches!(failed, Err(AppError::BadRequest(_))));

    let cart = cart_service::get_cart(state, customer)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);

    cart_service::clear_cart(state, customer).await?;
    Ok(())
}

async fn duplicate_submission_returns_first_order(
    state: &AppState,
    citrus: &ProductModel,
) -> anyhow::Result<()> {
    let key = format!("checkout-{}", Uuid::new_v4());
    let request = GuestCheckoutRequest {
        items: Vec::new(),
        product_ids: vec![citrus.id],
        shipping: shipping("Youssef Alami"),
        contact_email: None,
        total_amount: Decimal::from(50),
        idempotency_key: Some(key),
    };

    let first = order_service::checkout_guest(state, request.clone()).await?;
    let second = order_service::checkout_guest(state, request).await?;

    assert_eq!(first.message, "Order placed");
    assert_eq!(second.message, "Order already placed");
    let first = first.data.expect("first order");
    let second = second.data.expect("second order");
    assert_eq!(first.order.id, second.order.id);
    assert_eq!(first.order.order_number, second.order.order_number);
    Ok(())
}

async fn concurrent_orders_get_distinct_numbers(
    state: &AppState,
    oud: &ProductModel,
) -> anyhow::Result<()> {
    let mut handles = Vec::new();
    for i in 0..5 {
        let state = state.clone();
        let request = GuestCheckoutRequest {
            items: vec![GuestOrderLine {
                product_id: oud.id,
                quantity: Some(1),
                selected_size: None,
            }],
            product_ids: Vec::new(),
            shipping: shipping(&format!("Guest {i}")),
            contact_email: None,
            total_amount: Decimal::from(50),
            idempotency_key: None,
        };
        handles.push(tokio::spawn(async move {
            order_service::checkout_guest(&state, request).await
        }));
    }

    let mut numbers = HashSet::new();
    for handle in handles {
        let placed = handle.await??.data.expect("order");
        numbers.insert(placed.order.order_number);
    }
    assert_eq!(numbers.len(), 5);
    Ok(())
}

async fn order_management_requires_admin(
    state: &AppState,
    customer: &AuthUser,
    other: &AuthUser,
    admin: &AuthUser,
    oud: &ProductModel,
) -> anyhow::Result<()> {
    cart_service::add_to_cart(
        state,
        customer,
        AddToCartRequest {
            product_id: oud.id,
            quantity: 1,
            selected_size: None,
        },
    )
    .await?;
    let placed = order_service::checkout(
        state,
        customer,
        CheckoutRequest {
            shipping: shipping("Sara Idrissi"),
            contact_email: None,
            total_amount: Decimal::from(50),
            idempotency_key: None,
        },
    )
    .await?
    .data
    .expect("order");
    let order_id = placed.order.id;

    let hidden = order_service::get_order(state, other, order_id).await;
    assert!(matches!(hidden, Err(AppError::NotFound)));

    let status_change = order_service::update_order_status(
        state,
        customer,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Shipped,
        },
    )
    .await;
    assert!(matches!(status_change, Err(AppError::Forbidden)));

    let delete = order_service::delete_order(state, customer, order_id).await;
    assert!(matches!(delete, Err(AppError::Forbidden)));

    let unchanged = order_service::get_order(state, customer, order_id)
        .await?
        .data
        .expect("order");
    assert_eq!(unchanged.order.status, OrderStatus::Pending);

    let with_extra = order_service::add_order_item(
        state,
        admin,
        order_id,
        AddOrderItemRequest {
            product_id: oud.id,
            quantity: 2,
            selected_size: Some("30ml".into()),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(with_extra.items.len(), 2);
    assert_eq!(with_extra.order.total_amount, Decimal::from(150));

    // Admins may jump straight to a terminal state.
    let delivered = order_service::update_order_status(
        state,
        admin,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Delivered,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(delivered.status, OrderStatus::Delivered);

    let late_item = order_service::add_order_item(
        state,
        admin,
        order_id,
        AddOrderItemRequest {
            product_id: oud.id,
            quantity: 1,
            selected_size: None,
        },
    )
    .await;
    assert!(matches!(late_item, Err(AppError::BadRequest(_))));

    order_service::delete_order(state, admin, order_id).await?;
    let gone = order_service::get_order(state, admin, order_id).await;
    assert!(matches!(gone, Err(AppError::NotFound)));
    Ok(())
}

async fn idempotency_key_is_scoped_to_submitter(
    state: &AppState,
    customer: &AuthUser,
    other: &AuthUser,
    citrus: &ProductModel,
) -> anyhow::Result<()> {
    let guest_key = format!("guest-{}", Uuid::new_v4());
    let guest_request = GuestCheckoutRequest {
        items: Vec::new(),
        product_ids: vec![citrus.id],
        shipping: shipping("Nadia Bennani"),
        contact_email: Some("nadia@example.com".into()),
        total_amount: Decimal::from(50),
        idempotency_key: Some(guest_key.clone()),
    };
    order_service::checkout_guest(state, guest_request.clone()).await?;

    // A signed-in user with an empty cart cannot read the guest order back.
    let stolen = order_service::checkout(
        state,
        other,
        CheckoutRequest {
            shipping: shipping("Someone Else"),
            contact_email: None,
            total_amount: Decimal::ZERO,
            idempotency_key: Some(guest_key.clone()),
        },
    )
    .await;
    assert!(matches!(stolen, Err(AppError::Conflict(_))));

    let mut other_guest = guest_request.clone();
    other_guest.shipping.phone = "+212699999999".into();
    let stolen = order_service::checkout_guest(state, other_guest).await;
    assert!(matches!(stolen, Err(AppError::Conflict(_))));

    let replayed = order_service::checkout_guest(state, guest_request).await?;
    assert_eq!(replayed.message, "Order already placed");

    cart_service::add_to_cart(
        state,
        customer,
        AddToCartRequest {
            product_id: citrus.id,
            quantity: 1,
            selected_size: None,
        },
    )
    .await?;
    let account_key = format!("account-{}", Uuid::new_v4());
    let account_request = CheckoutRequest {
        shipping: shipping("Sara Idrissi"),
        contact_email: None,
        total_amount: Decimal::from(50),
        idempotency_key: Some(account_key.clone()),
    };
    let placed = order_service::checkout(state, customer, account_request.clone())
        .await?
        .data
        .expect("order");

    let stolen = order_service::checkout(state, other, account_request.clone()).await;
    assert!(matches!(stolen, Err(AppError::Conflict(_))));

    let replayed = order_service::checkout(state, customer, account_request)
        .await?
        .data
        .expect("order");
    assert_eq!(replayed.order.id, placed.order.id);
    Ok(())
}

async fn account_cart_updates_and_merges(
    state: &AppState,
    customer: &AuthUser,
    admin: &AuthUser,
    oud: &ProductModel,
    citrus: &ProductModel,
) -> anyhow::Result<()> {
    cart_service::add_to_cart(
        state,
        customer,
        AddToCartRequest {
            product_id: oud.id,
            quantity: 1,
            selected_size: Some("30ml".into()),
        },
    )
    .await?;

    let cart = cart_service::update_cart_item(
        state,
        customer,
        oud.id,
        UpdateCartItemRequest {
            quantity: 4,
            selected_size: None,
        },
    )
    .await?
    .data
    .expect("cart");
    assert_eq!(cart.items[0].quantity, 4);
    assert_eq!(cart.items[0].selected_size.as_deref(), Some("30ml"));

    // Updating a line that is not there changes nothing.
    let cart = cart_service::update_cart_item(
        state,
        customer,
        citrus.id,
        UpdateCartItemRequest {
            quantity: 2,
            selected_size: None,
        },
    )
    .await?
    .data
    .expect("cart");
    assert_eq!(cart.items.len(), 1);

    let cart = cart_service::update_cart_item(
        state,
        customer,
        oud.id,
        UpdateCartItemRequest {
            quantity: 0,
            selected_size: None,
        },
    )
    .await?
    .data
    .expect("cart");
    assert!(cart.items.is_empty());

    cart_service::add_to_cart(
        state,
        customer,
        AddToCartRequest {
            product_id: oud.id,
            quantity: 1,
            selected_size: Some("30ml".into()),
        },
    )
    .await?;

    let retired = create_product(state, "Retired", 40).await?;
    product_service::update_product(
        state,
        admin,
        retired.id,
        UpdateProductRequest {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await?;

    let guest_lines = vec![
        CartLine::new(oud.id, 2, Some("50ml".into())),
        CartLine::new(citrus.id, 1, None),
        CartLine::new(retired.id, 1, None),
    ];

    // The account cart keeps one line per product; a guest size replaces the stored one.
    let merged = cart_service::merge_guest_cart(
        state,
        customer,
        MergeCartRequest {
            lines: guest_lines.clone(),
        },
    )
    .await?;
    assert_eq!(merged.message, "Cart merged");
    let cart = merged.data.expect("cart");
    assert_eq!(cart.items.len(), 2);
    let oud_line = cart
        .items
        .iter()
        .find(|line| line.product_id == oud.id)
        .expect("oud line");
    assert_eq!(oud_line.quantity, 3);
    assert_eq!(oud_line.selected_size.as_deref(), Some("50ml"));
    assert!(cart.items.iter().all(|line| line.product_id != retired.id));

    // Same login session: the second merge is a no-op.
    let again = cart_service::merge_guest_cart(
        state,
        customer,
        MergeCartRequest {
            lines: guest_lines.clone(),
        },
    )
    .await?;
    assert_eq!(again.message, "Cart already merged");
    let cart = again.data.expect("cart");
    let oud_line = cart
        .items
        .iter()
        .find(|line| line.product_id == oud.id)
        .expect("oud line");
    assert_eq!(oud_line.quantity, 3);

    // A new login merges its own guest cart once more.
    let next_login = AuthUser {
        session_id: Uuid::new_v4().to_string(),
        ..customer.clone()
    };
    let cart = cart_service::merge_guest_cart(
        state,
        &next_login,
        MergeCartRequest {
            lines: vec![CartLine::new(citrus.id, 1, None)],
        },
    )
    .await?
    .data
    .expect("cart");
    let citrus_line = cart
        .items
        .iter()
        .find(|line| line.product_id == citrus.id)
        .expect("citrus line");
    assert_eq!(citrus_line.quantity, 2);

    cart_service::clear_cart(state, customer).await?;
    Ok(())
}

async fn rejected_total_rolls_back_checkout(
    state: &AppState,
    customer: &AuthUser,
    citrus: &ProductModel,
) -> anyhow::Result<()> {
    let mut config = (*state.config).clone();
    config.checkout.strict_totals = true;
    let strict = AppState::new(state.pool.clone(), state.orm.clone(), config);

    cart_service::add_to_cart(
        &strict,
        customer,
        AddToCartRequest {
            product_id: citrus.id,
            quantity: 3,
            selected_size: None,
        },
    )
    .await?;

    // The cart is read inside the checkout transaction before the total is rejected.
    let rejected = order_service::checkout(
        &strict,
        customer,
        CheckoutRequest {
            shipping: shipping("Sara Idrissi"),
            contact_email: None,
            total_amount: Decimal::from(1),
            idempotency_key: None,
        },
    )
    .await;
    assert!(matches!(rejected, Err(AppError::BadRequest(_))));

    let cart = cart_service::get_cart(&strict, customer)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);

    let placed = order_service::checkout(
        &strict,
        customer,
        CheckoutRequest {
            shipping: shipping("Sara Idrissi"),
            contact_email: None,
            total_amount: Decimal::from(150),
            idempotency_key: None,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(placed.items.len(), 1);
    Ok(())
}

async fn inactive_products_are_not_ordered(
    state: &AppState,
    admin: &AuthUser,
    citrus: &ProductModel,
) -> anyhow::Result<()> {
    let hidden = create_product(state, "Hidden", 70).await?;
    product_service::update_product(
        state,
        admin,
        hidden.id,
        UpdateProductRequest {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await?;

    let only_hidden = order_service::checkout_guest(
        state,
        GuestCheckoutRequest {
            items: Vec::new(),
            product_ids: vec![hidden.id],
            shipping: shipping("Karim Fassi"),
            contact_email: None,
            total_amount: Decimal::from(70),
            idempotency_key: None,
        },
    )
    .await;
    assert!(matches!(only_hidden, Err(AppError::BadRequest(_))));

    let mixed = order_service::checkout_guest(
        state,
        GuestCheckoutRequest {
            items: Vec::new(),
            product_ids: vec![hidden.id, citrus.id],
            shipping: shipping("Karim Fassi"),
            contact_email: None,
            total_amount: Decimal::from(50),
            idempotency_key: None,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(mixed.items.len(), 1);
    assert_eq!(mixed.items[0].product_id, citrus.id);
    Ok(())
}

async fn product_rename_is_validated(
    state: &AppState,
    admin: &AuthUser,
    citrus: &ProductModel,
) -> anyhow::Result<()> {
    let blank = product_service::update_product(
        state,
        admin,
        citrus.id,
        UpdateProductRequest {
            name: Some("   ".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(blank, Err(AppError::BadRequest(_))));

    let new_name = format!("Citrus Bloom {}", Uuid::new_v4());
    let renamed = product_service::update_product(
        state,
        admin,
        citrus.id,
        UpdateProductRequest {
            name: Some(format!("  {new_name} ")),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(renamed.name, new_name);
    Ok(())
}

fn shipping(name: &str) -> ShippingAddress {
    ShippingAddress {
        name: name.into(),
        address: "12 Rue des Fleurs".into(),
        city: "Casablanca".into(),
        phone: "+212600000000".into(),
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        public_dir: "public".into(),
        upload_dir: std::env::temp_dir().join("storefront-test-uploads"),
        notify: NotifyConfig::default(),
        checkout: CheckoutConfig::default(),
    };
    Ok(AppState::new(pool, orm, config))
}

async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: NotSet,
        email: Set(format!("{role}-{}@example.com", Uuid::new_v4())),
        name: Set(format!("Test {role}")),
        phone: Set(None),
        password_hash: Set("not-a-real-hash".into()),
        role: Set(role.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
        session_id: Uuid::new_v4().to_string(),
    })
}

async fn create_product(state: &AppState, name: &str, price: i64) -> anyhow::Result<ProductModel> {
    let product = ProductActive {
        id: NotSet,
        name: Set(format!("{name} {}", Uuid::new_v4())),
        description: Set(Some("A fragrance for testing".into())),
        category: Set(ProductCategory::Unisex),
        price: Set(Decimal::from(price)),
        discount_price: Set(None),
        image: Set(None),
        images: Set(Vec::new()),
        sizes: Set(vec!["30ml".into(), "50ml".into(), "100ml".into()]),
        notes: Set(None),
        stock: Set(100),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}
