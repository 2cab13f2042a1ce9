mod common;

use common::*;
use sea_orm::{EntityTrait, PaginatorTrait};
use storefront_api::{
    dto::{
        products::{CreateCategoryRequest, CreateProductRequest, InventoryAdjustRequest, UpdateProductRequest},
        promos::CreatePromoRequest,
    },
    entity::{AuditLogs, OrderItems, Products},
    error::AppError,
    models::OrderStatus,
    routes::params::{LowStockQuery, OrderListQuery, ProductQuery, ProductSortBy, SortOrder},
    services::{admin_service, cart_service, catalog_service, order_service},
};

#[tokio::test]
async fn customers_are_forbidden() {
    let state = test_state().await;
    let user = customer(&state).await;

    let err = admin_service::list_all_orders(&state, &user, OrderListQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = admin_service::list_promos(&state, &user).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}

#[tokio::test]
async fn order_status_follows_allowed_transitions() {
    let state = test_state().await;
    let admin = admin(&state).await;
    let user = customer(&state).await;
    let item = product(&state, "Chair", "350.00", 3).await;
    cart_service::add_to_cart(&state, &user, item).await.unwrap();
    let placed = order_service::place_order(&state, &user, checkout(None))
        .await
        .unwrap();

    let (all, meta) = admin_service::list_all_orders(&state, &admin, OrderListQuery::default())
        .await
        .unwrap();
    assert_eq!(all.items.len(), 1);
    assert_eq!(meta.total, Some(1));

    let shipped = admin_service::update_order_status(&state, &admin, placed.order_id, OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(shipped.status, OrderStatus::Shipped);

    let err = admin_service::update_order_status(&state, &admin, placed.order_id, OrderStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    admin_service::update_order_status(&state, &admin, placed.order_id, OrderStatus::Delivered)
        .await
        .unwrap();
    let details = admin_service::get_order_admin(&state, &admin, placed.order_id)
        .await
        .unwrap();
    assert_eq!(details.order.status, OrderStatus::Delivered);

    let audited = AuditLogs::find().count(&state.orm).await.unwrap();
    assert!(audited >= 3);
}

#[tokio::test]
async fn inventory_adjustments_never_go_negative() {
    let state = test_state().await;
    let admin = admin(&state).await;
    let item = product(&state, "Shelf", "90.00", 3).await;
    product(&state, "Desk", "450.00", 40).await;

    let (low, _) = admin_service::list_low_stock(&state, &admin, LowStockQuery::default())
        .await
        .unwrap();
    assert_eq!(low.items.len(), 1);
    assert_eq!(low.items[0].id, item);

    let updated = admin_service::adjust_inventory(&state, &admin, item, InventoryAdjustRequest { delta: 7 })
        .await
        .unwrap();
    assert_eq!(updated.stock_quantity, 10);

    let err = admin_service::adjust_inventory(&state, &admin, item, InventoryAdjustRequest { delta: -11 })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = admin_service::adjust_inventory(&state, &admin, item, InventoryAdjustRequest { delta: 0 })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(stock_of(&state, item).await, 10);
}

#[tokio::test]
async fn catalog_maintenance() {
    let state = test_state().await;
    let admin = admin(&state).await;

    let category = admin_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest { name: " Lighting ".into() },
    )
    .await
    .unwrap();
    assert_eq!(category.name, "Lighting");

    let err = admin_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest { name: "Lighting".into() },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let lamp = admin_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: "Desk Lamp".into(),
            description: None,
            price: dec("59.90"),
            stock_quantity: 12,
            image_url: None,
            category_id: Some(category.id),
        },
    )
    .await
    .unwrap();
    assert_eq!(lamp.price, dec("59.90"));

    let lamp = admin_service::update_product(
        &state,
        &admin,
        lamp.id,
        UpdateProductRequest {
            price: Some(dec("49.90")),
            ..UpdateProductRequest::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(lamp.price, dec("49.90"));
    assert_eq!(lamp.name, "Desk Lamp");

    let fetched = catalog_service::get_product(&state, lamp.id).await.unwrap();
    assert_eq!(fetched.stock_quantity, 12);

    admin_service::delete_category(&state, &admin, category.id)
        .await
        .unwrap();
    let err = catalog_service::get_product(&state, lamp.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn deleting_a_product_clears_its_lines() {
    let state = test_state().await;
    let admin = admin(&state).await;
    let user = customer(&state).await;
    let item = product(&state, "Mirror", "500.00", 5).await;

    cart_service::add_to_cart(&state, &user, item).await.unwrap();
    order_service::place_order(&state, &user, checkout(None))
        .await
        .unwrap();
    cart_service::add_to_cart(&state, &user, item).await.unwrap();

    admin_service::delete_product(&state, &admin, item).await.unwrap();

    assert_eq!(Products::find().count(&state.orm).await.unwrap(), 0);
    assert_eq!(OrderItems::find().count(&state.orm).await.unwrap(), 0);
    assert!(cart_service::get_cart(&state, &user).await.unwrap().is_empty());

    let err = admin_service::delete_product(&state, &admin, item).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn promo_codes_are_created_uppercase_and_can_be_deactivated() {
    let state = test_state().await;
    let admin = admin(&state).await;

    let promo = admin_service::create_promo(
        &state,
        &admin,
        CreatePromoRequest {
            code: " spring15 ".into(),
            discount_percent: 15,
            max_activations: 10,
            end_date: None,
            is_reusable: true,
        },
    )
    .await
    .unwrap();
    assert_eq!(promo.code, "SPRING15");
    assert!(promo.is_active);

    let err = admin_service::create_promo(
        &state,
        &admin,
        CreatePromoRequest {
            code: "TOOMUCH".into(),
            discount_percent: 120,
            max_activations: 10,
            end_date: None,
            is_reusable: true,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let promo = admin_service::deactivate_promo(&state, &admin, promo.id)
        .await
        .unwrap();
    assert!(!promo.is_active);

    let listed = admin_service::list_promos(&state, &admin).await.unwrap();
    assert_eq!(listed.items.len(), 1);
}

#[tokio::test]
async fn price_filters_and_sort_use_exact_amounts() {
    let state = test_state().await;
    let cheap = product(&state, "Coaster", "0.10", 10).await;
    let edge = product(&state, "Jug", "19.99", 10).await;
    product(&state, "Pitcher", "20.00", 10).await;

    let (found, meta) = catalog_service::list_products(
        &state,
        ProductQuery {
            min_price: Some(dec("0.10")),
            max_price: Some(dec("19.99")),
            sort_by: Some(ProductSortBy::Price),
            sort_order: Some(SortOrder::Desc),
            ..ProductQuery::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(meta.total, Some(2));
    let ids: Vec<_> = found.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![edge, cheap]);
    assert_eq!(found.items[1].price.to_string(), "0.10");

    let err = catalog_service::list_products(
        &state,
        ProductQuery {
            max_price: Some(rust_decimal::Decimal::MAX),
            ..ProductQuery::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("max_price")));
}
