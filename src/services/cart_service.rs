use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType, OnConflict, Query},
};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    dto::cart::{CartAction, CartItemUpdate, CartUpdateOutcome},
    entity::{
        cart_items::{
            ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems,
            Model as CartItemModel,
        },
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts},
        products::{Column as ProdCol, Entity as Products},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartLine, Product},
    pricing::{line_total, subtotal},
    services::catalog_service::find_product,
    state::AppState,
};

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<Cart> {
    load_cart(&state.orm, user.user_id).await
}

pub async fn get_cart_total(state: &AppState, user: &AuthUser) -> AppResult<Decimal> {
    Ok(load_cart(&state.orm, user.user_id).await?.total)
}

/// Adds one unit of `product_id`, creating the cart on first use.
///
/// Stock is only checked, not reserved: reservation happens at checkout.
pub async fn add_to_cart(state: &AppState, user: &AuthUser, product_id: Uuid) -> AppResult<CartLine> {
    let txn = state.orm.begin().await?;

    let product = find_product(&txn, product_id)
        .await?
        .filter(|p| p.stock_quantity >= 1)
        .ok_or(AppError::ProductUnavailable(product_id))?;

    let cart_id = ensure_cart(&txn, user.user_id).await?;

    CartItems::insert(CartItemActive {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart_id),
        product_id: Set(product_id),
        quantity: Set(1),
        created_at: Set(Utc::now().into()),
    })
    .on_conflict(
        OnConflict::columns([CartItemCol::CartId, CartItemCol::ProductId])
            .value(
                CartItemCol::Quantity,
                Expr::col((CartItems, CartItemCol::Quantity)).add(1),
            )
            .to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;

    let item = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .filter(CartItemCol::ProductId.eq(product_id))
        .one(&txn)
        .await?
        .ok_or(AppError::ProductUnavailable(product_id))?;

    txn.commit().await?;

    record_audit(
        &state.orm,
        user.user_id,
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": product_id, "quantity": item.quantity }),
    )
    .await;

    Ok(cart_line(item, product))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    action: CartAction,
) -> AppResult<CartItemUpdate> {
    let txn = state.orm.begin().await?;

    let item = find_owned_item(&txn, user.user_id, item_id).await?;
    let product = find_product(&txn, item.product_id)
        .await?
        .ok_or(AppError::ItemNotFound(item_id))?;

    let update = match action {
        CartAction::Increment if item.quantity >= product.stock_quantity => {
            tracing::warn!(
                item_id = %item.id,
                quantity = item.quantity,
                stock = product.stock_quantity,
                "increment refused at stock limit"
            );
            CartItemUpdate {
                item: Some(cart_line(item, product)),
                outcome: CartUpdateOutcome::StockLimitReached,
            }
        }
        CartAction::Increment => {
            let quantity = item.quantity + 1;
            let item = set_quantity(&txn, item, quantity).await?;
            CartItemUpdate {
                item: Some(cart_line(item, product)),
                outcome: CartUpdateOutcome::Incremented,
            }
        }
        CartAction::Decrement if item.quantity <= 1 => {
            CartItems::delete_by_id(item.id).exec(&txn).await?;
            CartItemUpdate {
                item: None,
                outcome: CartUpdateOutcome::Removed,
            }
        }
        CartAction::Decrement => {
            let quantity = item.quantity - 1;
            let item = set_quantity(&txn, item, quantity).await?;
            CartItemUpdate {
                item: Some(cart_line(item, product)),
                outcome: CartUpdateOutcome::Decremented,
            }
        }
    };

    txn.commit().await?;

    if update.outcome != CartUpdateOutcome::StockLimitReached {
        record_audit(
            &state.orm,
            user.user_id,
            "cart_update",
            "cart_items",
            serde_json::json!({ "item_id": item_id, "outcome": update.outcome }),
        )
        .await;
    }

    Ok(update)
}

/// Deletes the line. Never restocks: nothing was reserved for it.
pub async fn remove_from_cart(state: &AppState, user: &AuthUser, item_id: Uuid) -> AppResult<()> {
    let users_cart = Query::select()
        .column(CartCol::Id)
        .from(Carts)
        .and_where(CartCol::UserId.eq(user.user_id))
        .to_owned();

    let result = CartItems::delete_many()
        .filter(CartItemCol::Id.eq(item_id))
        .filter(CartItemCol::CartId.in_subquery(users_cart))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::ItemNotFound(item_id));
    }

    record_audit(
        &state.orm,
        user.user_id,
        "cart_remove",
        "cart_items",
        serde_json::json!({ "item_id": item_id }),
    )
    .await;

    Ok(())
}

/// Builds the full cart view for `user_id`. Users without a cart get an empty one.
pub async fn load_cart<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Cart> {
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?;

    let (id, lines) = match cart {
        Some(cart) => (Some(cart.id), load_lines(conn, cart.id, false).await?),
        None => (None, Vec::new()),
    };
    let total = subtotal(lines.iter().map(|line| (line.product.price, line.quantity)));

    Ok(Cart {
        id,
        user_id,
        lines,
        total,
    })
}

/// Cart lines with their products. With `for_update` the lines and then the product
/// rows, in id order, are locked `FOR UPDATE` until the transaction ends.
pub(crate) async fn load_lines<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
    for_update: bool,
) -> AppResult<Vec<CartLine>> {
    let mut items = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .order_by_asc(CartItemCol::CreatedAt)
        .order_by_asc(CartItemCol::Id);
    if for_update {
        items = items.lock(LockType::Update);
    }
    let items = items.all(conn).await?;
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
    let mut finder = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .order_by_asc(ProdCol::Id);
    if for_update {
        finder = finder.lock(LockType::Update);
    }
    let mut products: HashMap<Uuid, Product> = finder
        .all(conn)
        .await?
        .into_iter()
        .map(|model| (model.id, Product::from(model)))
        .collect();

    items
        .into_iter()
        .map(|item| {
            let product = products.remove(&item.product_id).ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "cart item {} points at missing product {}",
                    item.id,
                    item.product_id
                ))
            })?;
            Ok(cart_line(item, product))
        })
        .collect()
}

async fn ensure_cart<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Uuid> {
    if let Some(cart) = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        return Ok(cart.id);
    }

    if Users::find_by_id(user_id).one(conn).await?.is_none() {
        return Err(AppError::NotFound);
    }

    // A concurrent first add may create the row first; either way one cart survives.
    Carts::insert(CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: Set(Utc::now().into()),
    })
    .on_conflict(OnConflict::column(CartCol::UserId).do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(cart.id)
}

async fn find_owned_item<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    item_id: Uuid,
) -> AppResult<CartItemModel> {
    CartItems::find_by_id(item_id)
        .inner_join(Carts)
        .filter(CartCol::UserId.eq(user_id))
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::ItemNotFound(item_id))
}

async fn set_quantity<C: ConnectionTrait>(
    conn: &C,
    item: CartItemModel,
    quantity: i32,
) -> AppResult<CartItemModel> {
    let mut active: CartItemActive = item.into();
    active.quantity = Set(quantity);
    Ok(active.update(conn).await?)
}

fn cart_line(item: CartItemModel, product: Product) -> CartLine {
    CartLine {
        item_id: item.id,
        line_total: line_total(product.price, item.quantity),
        product,
        quantity: item.quantity,
    }
}
