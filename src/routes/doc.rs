use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{
            AddToCartRequest, CartLineView, CartView, GuestCartLines, GuestCartMutation,
            GuestCartRequest, MergeCartRequest, UpdateCartItemRequest,
        },
        orders::{
            AddOrderItemRequest, CheckoutRequest, GuestCheckoutRequest, GuestOrderLine,
            OrderItemList, OrderList, OrderStats, OrderWithItems, UpdateOrderStatusRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
    },
    models::{
        CartLine, FragranceNotes, Order, OrderItem, OrderStatus, Product, ProductCategory,
        ShippingAddress, User,
    },
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, health, orders, products, upload},
    services::upload_service::UploadedImage,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        products::list_products,
        products::search_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        cart::merge_cart,
        cart::guest_view,
        cart::guest_add,
        cart::guest_update,
        cart::guest_remove,
        orders::list_orders,
        orders::create_order,
        orders::create_guest_order,
        orders::get_order_by_number,
        orders::get_order,
        orders::get_order_items,
        orders::add_order_item,
        orders::update_order_status,
        orders::delete_order,
        admin::list_all_orders,
        admin::order_stats,
        upload::upload_image
    ),
    components(
        schemas(
            User,
            Product,
            ProductCategory,
            FragranceNotes,
            CartLine,
            Order,
            OrderItem,
            OrderStatus,
            ShippingAddress,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            AddToCartRequest,
            UpdateCartItemRequest,
            MergeCartRequest,
            GuestCartRequest,
            GuestCartMutation,
            GuestCartLines,
            CartView,
            CartLineView,
            CheckoutRequest,
            GuestCheckoutRequest,
            GuestOrderLine,
            UpdateOrderStatusRequest,
            AddOrderItemRequest,
            OrderWithItems,
            OrderList,
            OrderItemList,
            OrderStats,
            UploadedImage,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Auth", description = "Registration and sessions"),
        (name = "Products", description = "Catalog"),
        (name = "Cart", description = "Account and guest carts"),
        (name = "Orders", description = "Checkout and order tracking"),
        (name = "Admin", description = "Back-office"),
        (name = "Upload", description = "Product image upload"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
