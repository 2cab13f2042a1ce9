use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use crate::{
    dto::products::{CategoryList, ProductList},
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        products::{Column, Entity as Products},
    },
    error::{AppError, AppResult},
    models::{Category, Product},
    pricing::to_cents,
    response::Meta,
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub async fn list_categories(state: &AppState) -> AppResult<CategoryList> {
    let items = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();
    Ok(CategoryList { items })
}

pub async fn list_products(state: &AppState, query: ProductQuery) -> AppResult<(ProductList, Meta)> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        condition = condition.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(Column::Name))).like(pattern.clone()))
                .add(Expr::expr(Func::lower(Expr::col(Column::Description))).like(pattern)),
        );
    }

    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::PriceCents.gte(price_bound("min_price", min_price)?));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::PriceCents.lte(price_bound("max_price", max_price)?));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::PriceCents,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

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

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<Product> {
    find_product(&state.orm, id).await?.ok_or(AppError::NotFound)
}

/// Reads one product on any connection, including an open transaction.
pub async fn find_product<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<Option<Product>> {
    let product = Products::find_by_id(id).one(conn).await?.map(Product::from);
    Ok(product)
}

fn price_bound(field: &str, amount: Decimal) -> AppResult<i64> {
    to_cents(amount).ok_or_else(|| AppError::BadRequest(format!("{field} is out of range")))
}
