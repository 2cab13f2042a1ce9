use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::promos::{AppliedPromo, ValidatePromoRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::promo_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(validate_promo))
}

#[utoipa::path(
    post,
    path = "/api/promos/validate",
    request_body = ValidatePromoRequest,
    responses(
        (status = 200, description = "Discount the code would give on the current cart", body = ApiResponse<AppliedPromo>),
        (status = 400, description = "Invalid, expired, exhausted, already used or below the minimum subtotal"),
    ),
    security(("bearer_auth" = [])),
    tag = "Promos"
)]
pub async fn validate_promo(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ValidatePromoRequest>,
) -> AppResult<Json<ApiResponse<AppliedPromo>>> {
    let applied = promo_service::validate_promo(&state, &user, &payload.code).await?;
    Ok(Json(ApiResponse::success("Promo code applies", applied, None)))
}
