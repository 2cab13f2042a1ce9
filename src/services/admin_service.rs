use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
    sea_query::{LockType, Query},
};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    dto::{
        orders::{OrderDetails, OrderList},
        products::{
            CategoryList, CreateCategoryRequest, CreateProductRequest, InventoryAdjustRequest,
            ProductList, UpdateProductRequest,
        },
        promos::{CreatePromoRequest, PromoList},
    },
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders, ActiveModel as OrderActive},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        promo_codes::{ActiveModel as PromoActive, Column as PromoCol, Entity as PromoCodes},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Order, OrderStatus, Product, PromoCode},
    pricing::to_cents,
    response::Meta,
    routes::params::{LowStockQuery, OrderListQuery, SortOrder},
    services::{order_service::load_order_details, promo_service::normalize_code},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<(OrderList, Meta)> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
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

pub async fn get_order_admin(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<OrderDetails> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    load_order_details(&state.orm, order).await
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    status: OrderStatus,
) -> AppResult<Order> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if !existing.status.can_transition_to(status) {
        return Err(AppError::BadRequest(format!(
            "cannot move order from {:?} to {:?}",
            existing.status, status
        )));
    }

    let mut active: OrderActive = existing.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    record_audit(
        &state.orm,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(Order::from(order))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<(ProductList, Meta)> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(5);
    let (page, limit, offset) = query.pagination.normalize();

    let finder = Products::find()
        .filter(ProdCol::StockQuantity.lte(threshold))
        .order_by_asc(ProdCol::StockQuantity)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok((ProductList { items }, Meta::new(page, limit, total)))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<Product> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let new_stock = product
        .stock_quantity
        .checked_add(payload.delta)
        .filter(|stock| *stock >= 0)
        .ok_or_else(|| AppError::BadRequest("stock cannot be negative".into()))?;

    let mut active: ProductActive = product.into();
    active.stock_quantity = Set(new_stock);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    record_audit(
        &state.orm,
        user.user_id,
        "inventory_adjust",
        "products",
        serde_json::json!({ "product_id": updated.id, "delta": payload.delta }),
    )
    .await;

    Ok(Product::from(updated))
}

pub async fn list_categories_admin(state: &AppState, user: &AuthUser) -> AppResult<CategoryList> {
    ensure_admin(user)?;
    crate::services::catalog_service::list_categories(state).await
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<Category> {
    ensure_admin(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }

    let taken = Categories::find()
        .filter(CategoryCol::Name.eq(name.as_str()))
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::BadRequest(format!("category {name} already exists")));
    }

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    record_audit(
        &state.orm,
        user.user_id,
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(Category::from(category))
}

/// Destructive maintenance: removes the category and, with them, its products.
pub async fn delete_category(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let category = Categories::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let in_category = Query::select()
        .column(ProdCol::Id)
        .from(Products)
        .and_where(ProdCol::CategoryId.eq(category.id))
        .to_owned();
    CartItems::delete_many()
        .filter(CartItemCol::ProductId.in_subquery(in_category.clone()))
        .exec(&txn)
        .await?;
    OrderItems::delete_many()
        .filter(OrderItemCol::ProductId.in_subquery(in_category))
        .exec(&txn)
        .await?;
    let products = Products::delete_many()
        .filter(ProdCol::CategoryId.eq(category.id))
        .exec(&txn)
        .await?;
    Categories::delete_by_id(category.id).exec(&txn).await?;

    txn.commit().await?;

    tracing::warn!(
        category_id = %id,
        products = products.rows_affected,
        "category deleted with its products"
    );
    record_audit(
        &state.orm,
        user.user_id,
        "category_delete",
        "categories",
        serde_json::json!({ "category_id": id, "products_removed": products.rows_affected }),
    )
    .await;

    Ok(())
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<Product> {
    ensure_admin(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    let price_cents = price_cents(payload.price)?;
    if payload.stock_quantity < 0 {
        return Err(AppError::BadRequest("stock_quantity must not be negative".into()));
    }
    if let Some(category_id) = payload.category_id {
        ensure_category(state, category_id).await?;
    }

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        price_cents: Set(price_cents),
        stock_quantity: Set(payload.stock_quantity),
        image_url: Set(payload.image_url),
        category_id: Set(payload.category_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    record_audit(
        &state.orm,
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(Product::from(product))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<Product> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ProductActive = existing.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("name is required".into()));
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price_cents = Set(price_cents(price)?);
    }
    if let Some(stock) = payload.stock_quantity {
        if stock < 0 {
            return Err(AppError::BadRequest("stock_quantity must not be negative".into()));
        }
        active.stock_quantity = Set(stock);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(category_id) = payload.category_id {
        ensure_category(state, category_id).await?;
        active.category_id = Set(Some(category_id));
    }

    let product = active.update(&state.orm).await?;

    record_audit(
        &state.orm,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(Product::from(product))
}

/// Destructive maintenance: also removes the product from carts and order history.
pub async fn delete_product(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    CartItems::delete_many()
        .filter(CartItemCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    OrderItems::delete_many()
        .filter(OrderItemCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    Products::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    record_audit(
        &state.orm,
        user.user_id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(())
}

pub async fn create_promo(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePromoRequest,
) -> AppResult<PromoCode> {
    ensure_admin(user)?;
    let code = normalize_code(&payload.code);
    if code.is_empty() {
        return Err(AppError::BadRequest("code is required".into()));
    }
    if !(0..=100).contains(&payload.discount_percent) {
        return Err(AppError::BadRequest(
            "discount_percent must be between 0 and 100".into(),
        ));
    }
    if payload.max_activations < 1 {
        return Err(AppError::BadRequest("max_activations must be at least 1".into()));
    }

    let taken = PromoCodes::find()
        .filter(PromoCol::Code.eq(code.as_str()))
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::BadRequest(format!("promo code {code} already exists")));
    }

    let promo = PromoActive {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        discount_percent: Set(payload.discount_percent),
        activations_count: Set(0),
        max_activations: Set(payload.max_activations),
        end_date: Set(payload.end_date.map(Into::into)),
        is_active: Set(true),
        is_reusable: Set(payload.is_reusable),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    record_audit(
        &state.orm,
        user.user_id,
        "promo_create",
        "promo_codes",
        serde_json::json!({ "promo_id": promo.id, "code": promo.code }),
    )
    .await;

    Ok(PromoCode::from(promo))
}

pub async fn list_promos(state: &AppState, user: &AuthUser) -> AppResult<PromoList> {
    ensure_admin(user)?;
    let items = PromoCodes::find()
        .order_by_desc(PromoCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(PromoCode::from)
        .collect();
    Ok(PromoList { items })
}

pub async fn deactivate_promo(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<PromoCode> {
    ensure_admin(user)?;
    let existing = PromoCodes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: PromoActive = existing.into();
    active.is_active = Set(false);
    let promo = active.update(&state.orm).await?;

    record_audit(
        &state.orm,
        user.user_id,
        "promo_deactivate",
        "promo_codes",
        serde_json::json!({ "promo_id": promo.id }),
    )
    .await;

    Ok(PromoCode::from(promo))
}

async fn ensure_category(state: &AppState, id: Uuid) -> AppResult<()> {
    Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::BadRequest(format!("category {id} does not exist")))
}

fn price_cents(price: Decimal) -> AppResult<i64> {
    if price.is_sign_negative() {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    to_cents(price).ok_or_else(|| AppError::BadRequest("price is out of range".into()))
}
