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
        cart::{AddToCartRequest, CartItemUpdate, CartTotal, CartUpdateOutcome, UpdateCartItemRequest},
        orders::{
            AddressFields, CheckoutRequest, OrderDetails, OrderList, PlacedOrder,
            UpdateOrderStatusRequest,
        },
        products::{
            CategoryList, CreateCategoryRequest, CreateProductRequest, InventoryAdjustRequest,
            ProductList, UpdateProductRequest,
        },
        promos::{AppliedPromo, CreatePromoRequest, PromoList, ValidatePromoRequest},
    },
    models::{
        Cart, CartLine, Category, DeliveryAddress, Order, OrderItem, OrderStatus, Product,
        PromoCode, User,
    },
    response::{ApiResponse, Meta},
    routes::{admin, cart, health, orders, params, products, promos},
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
        products::list_products,
        products::get_product,
        products::list_categories,
        cart::get_cart,
        cart::add_to_cart,
        cart::get_cart_total,
        cart::update_cart_item,
        cart::remove_from_cart,
        promos::validate_promo,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::list_categories,
        admin::create_category,
        admin::delete_category,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::list_promos,
        admin::create_promo,
        admin::deactivate_promo
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            Cart,
            CartLine,
            PromoCode,
            Order,
            OrderItem,
            OrderStatus,
            DeliveryAddress,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartItemUpdate,
            CartUpdateOutcome,
            CartTotal,
            ValidatePromoRequest,
            AppliedPromo,
            CreatePromoRequest,
            PromoList,
            AddressFields,
            CheckoutRequest,
            PlacedOrder,
            OrderDetails,
            OrderList,
            UpdateOrderStatusRequest,
            CreateCategoryRequest,
            CreateProductRequest,
            UpdateProductRequest,
            InventoryAdjustRequest,
            ProductList,
            CategoryList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::LowStockQuery,
            Meta,
            ApiResponse<Cart>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<PlacedOrder>,
            ApiResponse<OrderDetails>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Promos", description = "Promo code endpoints"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Admin", description = "Back-office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
