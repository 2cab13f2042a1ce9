mod common;

use common::*;
use sea_orm::{ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait, Statement};
use storefront_api::{
    config::{CheckoutPolicy, PromoFailurePolicy},
    entity::{DeliveryAddresses, OrderItems, Orders},
    error::{AppError, PromoError},
    models::OrderStatus,
    routes::params::OrderListQuery,
    services::{cart_service, order_service},
};

#[tokio::test]
async fn checkout_turns_cart_into_order() {
    let state = test_state().await;
    let user = customer(&state).await;
    let a = product(&state, "Kettle", "500.00", 10).await;
    let b = product(&state, "Toaster", "750.00", 5).await;

    cart_service::add_to_cart(&state, &user, a).await.unwrap();
    cart_service::add_to_cart(&state, &user, a).await.unwrap();
    cart_service::add_to_cart(&state, &user, b).await.unwrap();

    let placed = order_service::place_order(&state, &user, checkout(None))
        .await
        .unwrap();

    let order = &placed.order.order;
    assert_eq!(order.subtotal_amount, dec("1750.00"));
    assert_eq!(order.total_amount, dec("1750.00"));
    assert_eq!(order.discount_percent, 0);
    assert_eq!(order.promo_code_id, None);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(placed.order.items.len(), 2);
    assert_eq!(placed.order.delivery_address.city, "Kazan");
    assert!(placed.promo_warning.is_none());

    let kettle = placed
        .order
        .items
        .iter()
        .find(|item| item.product_id == a)
        .unwrap();
    assert_eq!(kettle.quantity, 2);
    assert_eq!(kettle.price_at_purchase, dec("500.00"));

    assert_eq!(stock_of(&state, a).await, 8);
    assert_eq!(stock_of(&state, b).await, 4);
    assert!(cart_service::get_cart(&state, &user).await.unwrap().is_empty());

    assert_eq!(Orders::find().count(&state.orm).await.unwrap(), 1);
    assert_eq!(OrderItems::find().count(&state.orm).await.unwrap(), 2);
    assert_eq!(DeliveryAddresses::find().count(&state.orm).await.unwrap(), 1);
}

#[tokio::test]
async fn promo_discounts_total_and_counts_activation() {
    let state = test_state().await;
    let user = customer(&state).await;
    let item = product(&state, "Blender", "1000.00", 5).await;
    let promo_id = promo(&state, PromoSeed::default()).await;

    cart_service::add_to_cart(&state, &user, item).await.unwrap();
    cart_service::add_to_cart(&state, &user, item).await.unwrap();

    let placed = order_service::place_order(&state, &user, checkout(Some(" save10 ")))
        .await
        .unwrap();

    let order = &placed.order.order;
    assert_eq!(order.subtotal_amount, dec("2000.00"));
    assert_eq!(order.total_amount, dec("1800.00"));
    assert_eq!(order.discount_percent, 10);
    assert_eq!(order.promo_code_id, Some(promo_id));

    let promo = promo_row(&state, promo_id).await;
    assert_eq!(promo.activations_count, 1);
    assert!(promo.is_active);
}

#[tokio::test]
async fn single_use_promo_is_rejected_the_second_time() {
    let state = test_state().await;
    let user = customer(&state).await;
    let item = product(&state, "Mixer", "600.00", 5).await;
    let promo_id = promo(
        &state,
        PromoSeed {
            code: "ONCE",
            is_reusable: false,
            ..PromoSeed::default()
        },
    )
    .await;

    cart_service::add_to_cart(&state, &user, item).await.unwrap();
    order_service::place_order(&state, &user, checkout(Some("ONCE")))
        .await
        .unwrap();

    cart_service::add_to_cart(&state, &user, item).await.unwrap();
    let err = order_service::place_order(&state, &user, checkout(Some("ONCE")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Promo(PromoError::AlreadyUsed)));

    // rejected checkout left everything in place
    assert_eq!(stock_of(&state, item).await, 4);
    assert_eq!(cart_service::get_cart(&state, &user).await.unwrap().lines.len(), 1);
    assert_eq!(promo_row(&state, promo_id).await.activations_count, 1);
    assert_eq!(Orders::find().count(&state.orm).await.unwrap(), 1);
}

#[tokio::test]
async fn promo_deactivates_at_its_ceiling() {
    let state = test_state().await;
    let first = customer(&state).await;
    let second = customer(&state).await;
    let item = product(&state, "Grill", "800.00", 5).await;
    let promo_id = promo(
        &state,
        PromoSeed {
            code: "LAST",
            max_activations: 1,
            ..PromoSeed::default()
        },
    )
    .await;

    cart_service::add_to_cart(&state, &first, item).await.unwrap();
    order_service::place_order(&state, &first, checkout(Some("LAST")))
        .await
        .unwrap();

    let promo = promo_row(&state, promo_id).await;
    assert_eq!(promo.activations_count, 1);
    assert!(!promo.is_active);

    cart_service::add_to_cart(&state, &second, item).await.unwrap();
    let err = order_service::place_order(&state, &second, checkout(Some("LAST")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Promo(PromoError::Invalid)));
}

#[tokio::test]
async fn promo_below_minimum_aborts_by_default() {
    let state = test_state().await;
    let user = customer(&state).await;
    let item = product(&state, "Spoon", "300.00", 5).await;
    promo(&state, PromoSeed::default()).await;

    cart_service::add_to_cart(&state, &user, item).await.unwrap();
    let err = order_service::place_order(&state, &user, checkout(Some("SAVE10")))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Promo(PromoError::BelowMinimum { minimum }) if minimum == dec("500.00")
    ));
    assert_eq!(stock_of(&state, item).await, 5);
    assert!(!cart_service::get_cart(&state, &user).await.unwrap().is_empty());
}

#[tokio::test]
async fn expired_promo_is_rejected() {
    let state = test_state().await;
    let user = customer(&state).await;
    let item = product(&state, "Pan", "900.00", 5).await;
    promo(
        &state,
        PromoSeed {
            code: "OLD",
            end_date: Some(chrono::Utc::now() - chrono::Duration::days(1)),
            ..PromoSeed::default()
        },
    )
    .await;

    cart_service::add_to_cart(&state, &user, item).await.unwrap();
    let err = order_service::place_order(&state, &user, checkout(Some("OLD")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Promo(PromoError::Expired)));
}

#[tokio::test]
async fn degrade_policy_charges_full_price_with_warning() {
    let state = test_state_with(CheckoutPolicy {
        promo_failure: PromoFailurePolicy::Degrade,
        ..CheckoutPolicy::default()
    })
    .await;
    let user = customer(&state).await;
    let item = product(&state, "Wok", "1000.00", 5).await;

    cart_service::add_to_cart(&state, &user, item).await.unwrap();
    let placed = order_service::place_order(&state, &user, checkout(Some("NOPE")))
        .await
        .unwrap();

    assert_eq!(placed.order.order.total_amount, dec("1000.00"));
    assert_eq!(placed.order.order.promo_code_id, None);
    assert_eq!(
        placed.promo_warning.as_deref(),
        Some("Promo code is invalid or inactive")
    );
    assert_eq!(stock_of(&state, item).await, 4);
}

#[tokio::test]
async fn insufficient_stock_changes_nothing() {
    let state = test_state().await;
    let user = customer(&state).await;
    let plenty = product(&state, "Fork", "100.00", 10).await;
    let scarce = product(&state, "Knife", "200.00", 1).await;

    cart_service::add_to_cart(&state, &user, plenty).await.unwrap();
    cart_service::add_to_cart(&state, &user, scarce).await.unwrap();
    // adding is not capped by stock; checkout is where it counts
    cart_service::add_to_cart(&state, &user, scarce).await.unwrap();

    let err = order_service::place_order(&state, &user, checkout(None))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientStock { ref product, available: 1 } if product == "Knife"
    ));

    assert_eq!(stock_of(&state, plenty).await, 10);
    assert_eq!(stock_of(&state, scarce).await, 1);
    assert_eq!(cart_service::get_cart(&state, &user).await.unwrap().lines.len(), 2);
    assert_eq!(Orders::find().count(&state.orm).await.unwrap(), 0);
}

#[tokio::test]
async fn concurrent_checkouts_sell_the_last_unit_once() {
    let state = test_state().await;
    let first = customer(&state).await;
    let second = customer(&state).await;
    let last = product(&state, "Limited Print", "1500.00", 1).await;

    cart_service::add_to_cart(&state, &first, last).await.unwrap();
    cart_service::add_to_cart(&state, &second, last).await.unwrap();

    let (a, b) = tokio::join!(
        order_service::place_order(&state, &first, checkout(None)),
        order_service::place_order(&state, &second, checkout(None)),
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes.iter().any(|r| matches!(
        r,
        Err(AppError::InsufficientStock { available: 0, .. })
    )));
    assert_eq!(stock_of(&state, last).await, 0);
    assert_eq!(Orders::find().count(&state.orm).await.unwrap(), 1);
}

#[tokio::test]
async fn empty_cart_cannot_be_checked_out() {
    let state = test_state().await;
    let user = customer(&state).await;

    let err = order_service::place_order(&state, &user, checkout(None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmptyCart));

    // a cart that was emptied again is still empty
    let item = product(&state, "Cup", "50.00", 3).await;
    let line = cart_service::add_to_cart(&state, &user, item).await.unwrap();
    cart_service::remove_from_cart(&state, &user, line.item_id)
        .await
        .unwrap();
    let err = order_service::place_order(&state, &user, checkout(None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmptyCart));
}

#[tokio::test]
async fn customer_without_valid_phone_cannot_order() {
    let state = test_state().await;
    let user = customer_with_phone(&state, "12-34").await;
    let item = product(&state, "Plate", "120.00", 3).await;

    cart_service::add_to_cart(&state, &user, item).await.unwrap();
    let err = order_service::place_order(&state, &user, checkout(None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidPhone));
    assert_eq!(stock_of(&state, item).await, 3);
}

#[tokio::test]
async fn blank_address_field_is_rejected() {
    let state = test_state().await;
    let user = customer(&state).await;
    let item = product(&state, "Bowl", "80.00", 3).await;
    cart_service::add_to_cart(&state, &user, item).await.unwrap();

    let mut request = checkout(None);
    request.address.street = "   ".into();
    let err = order_service::place_order(&state, &user, request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("street")));
}

#[tokio::test]
async fn order_history_is_private_to_its_owner() {
    let state = test_state().await;
    let owner = customer(&state).await;
    let stranger = customer(&state).await;
    let item = product(&state, "Lamp", "400.00", 3).await;

    cart_service::add_to_cart(&state, &owner, item).await.unwrap();
    let placed = order_service::place_order(&state, &owner, checkout(None))
        .await
        .unwrap();

    let (history, meta) = order_service::list_orders(&state, &owner, OrderListQuery::default())
        .await
        .unwrap();
    assert_eq!(history.items.len(), 1);
    assert_eq!(meta.total, Some(1));

    let details = order_service::get_order(&state, &owner, placed.order_id)
        .await
        .unwrap();
    assert_eq!(details.items.len(), 1);
    assert_eq!(details.delivery_address.apartment.as_deref(), Some("12"));

    let (empty, _) = order_service::list_orders(&state, &stranger, OrderListQuery::default())
        .await
        .unwrap();
    assert!(empty.items.is_empty());
    let err = order_service::get_order(&state, &stranger, placed.order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn money_is_stored_as_exact_cents() {
    let state = test_state().await;
    let user = customer(&state).await;
    let item = product(&state, "Kettle", "500.10", 10).await;

    let row = state
        .orm
        .query_one(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT typeof(price_cents) AS kind, price_cents FROM products",
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.try_get::<String>("", "kind").unwrap(), "integer");
    assert_eq!(row.try_get::<i64>("", "price_cents").unwrap(), 50010);

    for _ in 0..3 {
        cart_service::add_to_cart(&state, &user, item).await.unwrap();
    }
    let placed = order_service::place_order(&state, &user, checkout(None))
        .await
        .unwrap();
    assert_eq!(placed.order.order.total_amount, dec("1500.30"));
    assert_eq!(placed.order.items[0].price_at_purchase, dec("500.10"));

    let row = state
        .orm
        .query_one(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT typeof(total_cents) AS kind, subtotal_cents, total_cents FROM orders",
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.try_get::<String>("", "kind").unwrap(), "integer");
    assert_eq!(row.try_get::<i64>("", "subtotal_cents").unwrap(), 150030);
    assert_eq!(row.try_get::<i64>("", "total_cents").unwrap(), 150030);

    let history = order_service::get_order(&state, &user, placed.order_id)
        .await
        .unwrap();
    assert_eq!(history.order.total_amount.to_string(), "1500.30");
}

#[tokio::test]
async fn checkout_clears_only_the_lines_it_ordered() {
    let state = test_state().await;
    let user = customer(&state).await;
    let other = customer(&state).await;
    let kettle = product(&state, "Kettle", "600.00", 5).await;
    let filter = product(&state, "Spare Filter", "20.00", 5).await;

    cart_service::add_to_cart(&state, &user, kettle).await.unwrap();
    let late = cart_service::add_to_cart(&state, &other, filter).await.unwrap();

    // A line that reaches the cart after checkout has read it.
    state
        .orm
        .execute_unprepared(
            "CREATE TRIGGER late_cart_line AFTER INSERT ON delivery_addresses BEGIN \
             UPDATE cart_items SET cart_id = (\
                 SELECT cart_id FROM cart_items \
                 WHERE product_id = (SELECT id FROM products WHERE name = 'Kettle')\
             ) WHERE product_id = (SELECT id FROM products WHERE name = 'Spare Filter'); \
             END;",
        )
        .await
        .unwrap();

    let placed = order_service::place_order(&state, &user, checkout(None))
        .await
        .unwrap();
    assert_eq!(placed.order.items.len(), 1);
    assert_eq!(placed.order.items[0].product_id, kettle);

    let cart = cart_service::get_cart(&state, &user).await.unwrap();
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].item_id, late.item_id);
    assert_eq!(stock_of(&state, kettle).await, 4);
    assert_eq!(stock_of(&state, filter).await, 5);
}

#[tokio::test]
async fn failure_after_writes_rolls_everything_back() {
    let state = test_state().await;
    let user = customer(&state).await;
    let item = product(&state, "Kettle", "600.00", 10).await;
    let promo_id = promo(&state, PromoSeed::default()).await;
    cart_service::add_to_cart(&state, &user, item).await.unwrap();

    // Stock, order and items are already written when the address insert fails.
    state
        .orm
        .execute_unprepared(
            "CREATE TRIGGER address_store_down BEFORE INSERT ON delivery_addresses BEGIN \
             SELECT RAISE(ABORT, 'address store unavailable'); \
             END;",
        )
        .await
        .unwrap();

    let err = order_service::place_order(&state, &user, checkout(Some("SAVE10")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Transaction(_)));

    assert_eq!(stock_of(&state, item).await, 10);
    assert_eq!(cart_service::get_cart(&state, &user).await.unwrap().lines.len(), 1);
    let promo = promo_row(&state, promo_id).await;
    assert_eq!(promo.activations_count, 0);
    assert!(promo.is_active);
    assert_eq!(Orders::find().count(&state.orm).await.unwrap(), 0);
    assert_eq!(OrderItems::find().count(&state.orm).await.unwrap(), 0);
    assert_eq!(DeliveryAddresses::find().count(&state.orm).await.unwrap(), 0);

    state
        .orm
        .execute_unprepared("DROP TRIGGER address_store_down;")
        .await
        .unwrap();
    let placed = order_service::place_order(&state, &user, checkout(Some("SAVE10")))
        .await
        .unwrap();
    assert_eq!(placed.order.order.total_amount, dec("540.00"));
    assert_eq!(stock_of(&state, item).await, 9);
}

#[tokio::test]
async fn oversized_address_field_is_rejected() {
    let state = test_state().await;
    let user = customer(&state).await;
    let item = product(&state, "Bowl", "80.00", 3).await;
    cart_service::add_to_cart(&state, &user, item).await.unwrap();

    let mut request = checkout(None);
    request.address.city = "K".repeat(101);
    let err = order_service::place_order(&state, &user, request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(msg) if msg == "city must be at most 100 characters"));

    assert_eq!(stock_of(&state, item).await, 3);
    assert_eq!(Orders::find().count(&state.orm).await.unwrap(), 0);
}
