use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    config::{CheckoutPolicy, PromoFailurePolicy},
    dto::{
        orders::{AddressFields, CheckoutRequest, OrderDetails, OrderList, PlacedOrder},
        promos::AppliedPromo,
    },
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        delivery_addresses::{
            ActiveModel as DeliveryAddressActive, Column as AddressCol, Entity as DeliveryAddresses,
        },
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
        users::Entity as Users,
    },
    error::{AppError, AppResult, PromoError},
    middleware::auth::AuthUser,
    models::{CartLine, DeliveryAddress, Order, OrderItem, OrderStatus, PromoCode},
    pricing::{subtotal, to_cents},
    response::Meta,
    routes::params::{OrderListQuery, SortOrder},
    services::{
        cart_service::load_lines,
        catalog_service::find_product,
        promo_service::{consume_activation, count_prior_uses, find_promo, normalize_code, validate},
    },
    state::AppState,
};

/// Turns the caller's cart into an order.
///
/// Everything from the stock check to clearing the cart runs in one transaction;
/// any error rolls all of it back, leaving stock, cart and promo counters untouched.
#[tracing::instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<PlacedOrder> {
    let address = payload.address.normalized()?;
    let promo_code = payload
        .promo_code
        .as_deref()
        .map(normalize_code)
        .filter(|code| !code.is_empty());

    let txn = state.orm.begin().await?;
    let outcome = place_order_in(
        &txn,
        &state.config.checkout,
        user.user_id,
        address,
        promo_code.as_deref(),
    )
    .await;

    let placed = match outcome {
        Ok(placed) => {
            txn.commit().await?;
            placed
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "checkout rollback failed");
            }
            tracing::warn!(error = %err, "checkout rejected");
            return Err(err);
        }
    };

    tracing::info!(
        order_id = %placed.order_id,
        total = %placed.order.order.total_amount,
        promo = ?placed.order.order.promo_code_id,
        "order placed"
    );

    record_audit(
        &state.orm,
        user.user_id,
        "checkout",
        "orders",
        serde_json::json!({
            "order_id": placed.order_id,
            "total_amount": placed.order.order.total_amount,
        }),
    )
    .await;

    Ok(placed)
}

async fn place_order_in(
    txn: &DatabaseTransaction,
    policy: &CheckoutPolicy,
    user_id: Uuid,
    address: AddressFields,
    promo_code: Option<&str>,
) -> AppResult<PlacedOrder> {
    let user = Users::find_by_id(user_id)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if !is_valid_phone(&user.phone) {
        return Err(AppError::InvalidPhone);
    }

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::EmptyCart)?;
    let lines = load_lines(txn, cart.id, true).await?;
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    // Every line is checked before anything is written.
    for line in &lines {
        if line.product.stock_quantity < line.quantity {
            return Err(AppError::InsufficientStock {
                product: line.product.name.clone(),
                available: line.product.stock_quantity,
            });
        }
    }

    let subtotal = subtotal(lines.iter().map(|line| (line.product.price, line.quantity)));

    let mut promo_warning = None;
    let promo = match promo_code {
        Some(code) => match resolve_promo(txn, policy, user_id, code, subtotal).await? {
            Ok(applied) => Some(applied),
            Err(err) if policy.promo_failure == PromoFailurePolicy::Degrade => {
                tracing::warn!(code, error = %err, "promo dropped, charging full price");
                promo_warning = Some(err.to_string());
                None
            }
            Err(err) => return Err(err.into()),
        },
        None => None,
    };
    let total = promo
        .as_ref()
        .map_or(subtotal, |(applied, _)| applied.discounted_total);

    for line in &lines {
        reserve_stock(txn, line).await?;
    }

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        subtotal_cents: Set(stored_cents(subtotal)?),
        total_cents: Set(stored_cents(total)?),
        discount_percent: Set(promo.as_ref().map_or(0, |(applied, _)| applied.discount_percent)),
        promo_code_id: Set(promo.as_ref().map(|(applied, _)| applied.promo_id)),
        status: Set(OrderStatus::Pending),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product.id),
            quantity: Set(line.quantity),
            price_at_purchase_cents: Set(stored_cents(line.product.price)?),
        }
        .insert(txn)
        .await?;
        items.push(OrderItem::from(item));
    }

    let delivery_address = DeliveryAddressActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        full_name: Set(address.full_name),
        phone: Set(address.phone),
        city: Set(address.city),
        street: Set(address.street),
        building: Set(address.building),
        apartment: Set(address.apartment),
        postal_code: Set(address.postal_code),
        comment: Set(address.comment),
        created_at: Set(now.into()),
    }
    .insert(txn)
    .await?;

    if let Some((_, promo)) = &promo {
        consume_activation(txn, promo).await?;
    }

    // Only the lines that were priced; anything added meanwhile stays in the cart.
    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::Id.is_in(lines.iter().map(|line| line.item_id)))
        .exec(txn)
        .await?;

    Ok(PlacedOrder {
        order_id: order.id,
        order: OrderDetails {
            order: Order::from(order),
            items,
            delivery_address: DeliveryAddress::from(delivery_address),
        },
        promo_warning,
    })
}

fn stored_cents(amount: Decimal) -> AppResult<i64> {
    to_cents(amount).ok_or_else(|| AppError::BadRequest("order amount is out of range".into()))
}

/// Looks the code up under a row lock and validates it. The outer error is a
/// store failure; the inner one is the promo verdict, left to the caller's policy.
async fn resolve_promo(
    txn: &DatabaseTransaction,
    policy: &CheckoutPolicy,
    user_id: Uuid,
    code: &str,
    subtotal: Decimal,
) -> AppResult<Result<(AppliedPromo, PromoCode), PromoError>> {
    let promo = find_promo(txn, code, true).await?;
    let prior_uses = match &promo {
        Some(promo) => count_prior_uses(txn, user_id, promo.id).await?,
        None => 0,
    };
    let verdict = validate(
        promo.as_ref(),
        subtotal,
        prior_uses,
        policy.promo_min_subtotal,
        Utc::now(),
    );
    Ok(match (verdict, promo) {
        (Ok(applied), Some(promo)) => Ok((applied, promo)),
        (Ok(_), None) => Err(PromoError::Invalid),
        (Err(err), _) => Err(err),
    })
}

/// Decrements stock only if enough is left, so a racing checkout can never
/// drive `stock_quantity` below zero even without row locks.
async fn reserve_stock(txn: &DatabaseTransaction, line: &CartLine) -> AppResult<()> {
    let result = Products::update_many()
        .col_expr(
            ProdCol::StockQuantity,
            Expr::col(ProdCol::StockQuantity).sub(line.quantity),
        )
        .filter(ProdCol::Id.eq(line.product.id))
        .filter(ProdCol::StockQuantity.gte(line.quantity))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        let available = find_product(txn, line.product.id)
            .await?
            .map_or(0, |product| product.stock_quantity);
        return Err(AppError::InsufficientStock {
            product: line.product.name.clone(),
            available,
        });
    }
    Ok(())
}

/// Optional leading `+`, separators ignored, 10 to 15 digits.
pub fn is_valid_phone(raw: &str) -> bool {
    let trimmed = raw.trim();
    let number = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let mut digits = 0;
    for ch in number.chars() {
        match ch {
            '0'..='9' => digits += 1,
            ' ' | '-' | '(' | ')' => {}
            _ => return false,
        }
    }
    (10..=15).contains(&digits)
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<(OrderList, Meta)> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok((OrderList { items: orders }, Meta::new(page, limit, total)))
}

pub async fn get_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<OrderDetails> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    load_order_details(&state.orm, order).await
}

/// Order plus its items and delivery address.
pub async fn load_order_details<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderDetails> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    let delivery_address = DeliveryAddresses::find()
        .filter(AddressCol::OrderId.eq(order.id))
        .one(conn)
        .await?
        .map(DeliveryAddress::from)
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("order {} has no delivery address", order.id))
        })?;

    Ok(OrderDetails {
        order: Order::from(order),
        items,
        delivery_address,
    })
}
