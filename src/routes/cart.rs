use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartAction, CartItemUpdate, CartTotal, UpdateCartItemRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Cart, CartLine},
    response::{ApiResponse, Meta},
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).post(add_to_cart))
        .route("/total", get(get_cart_total))
        .route("/items/{id}", patch(update_cart_item).delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current cart with lines and total", body = ApiResponse<Cart>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let cart = cart_service::get_cart(&state, &user).await?;
    Ok(Json(ApiResponse::success("OK", cart, Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Added one unit, merging with an existing line", body = ApiResponse<CartLine>),
        (status = 400, description = "Product unavailable"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartLine>>> {
    let line = cart_service::add_to_cart(&state, &user, payload.product_id).await?;
    Ok(Json(ApiResponse::success("Added to cart", line, None)))
}

#[utoipa::path(
    get,
    path = "/api/cart/total",
    responses(
        (status = 200, description = "Cart total", body = ApiResponse<CartTotal>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart_total(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartTotal>>> {
    let total = cart_service::get_cart_total(&state, &user).await?;
    Ok(Json(ApiResponse::success("OK", CartTotal { total }, None)))
}

#[utoipa::path(
    patch,
    path = "/api/cart/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart item ID")
    ),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity changed, or a warning when stock is exhausted", body = ApiResponse<CartItemUpdate>),
        (status = 400, description = "Unknown action"),
        (status = 404, description = "Cart item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartItemUpdate>>> {
    let action: CartAction = payload.action.parse()?;
    let update = cart_service::update_cart_item(&state, &user, id, action).await?;
    let warning = update.warning();
    Ok(Json(ApiResponse::success("OK", update, None).with_warning(warning)))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart item ID")
    ),
    responses(
        (status = 200, description = "Removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Cart item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    cart_service::remove_from_cart(&state, &user, id).await?;
    Ok(Json(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
