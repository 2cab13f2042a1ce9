//! Promo code rules. [`validate`] is pure; the activation counter only moves
//! inside the checkout transaction via [`consume_activation`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    dto::promos::AppliedPromo,
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        promo_codes::{Column as PromoCol, Entity as PromoCodes},
    },
    error::{AppResult, PromoError},
    middleware::auth::AuthUser,
    models::PromoCode,
    pricing::{apply_discount, normalize},
    services::cart_service::load_cart,
    state::AppState,
};

pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Checks, in order: exists and active, not expired, activations left,
/// single-use not yet spent by this customer, subtotal at or above `min_subtotal`.
pub fn validate(
    promo: Option<&PromoCode>,
    subtotal: Decimal,
    prior_uses: u64,
    min_subtotal: Decimal,
    now: DateTime<Utc>,
) -> Result<AppliedPromo, PromoError> {
    let promo = promo.filter(|p| p.is_active).ok_or(PromoError::Invalid)?;

    if promo.end_date.is_some_and(|end| end <= now) {
        return Err(PromoError::Expired);
    }
    if promo.activations_count >= promo.max_activations {
        return Err(PromoError::Exhausted);
    }
    if !promo.is_reusable && prior_uses > 0 {
        return Err(PromoError::AlreadyUsed);
    }
    if subtotal < min_subtotal {
        return Err(PromoError::BelowMinimum {
            minimum: normalize(min_subtotal),
        });
    }

    let subtotal = normalize(subtotal);
    let discounted_total = apply_discount(subtotal, promo.discount_percent);
    Ok(AppliedPromo {
        promo_id: promo.id,
        code: promo.code.clone(),
        discount_percent: promo.discount_percent,
        subtotal,
        discount_amount: subtotal - discounted_total,
        discounted_total,
    })
}

/// Preview against the caller's current cart. Never consumes an activation.
pub async fn validate_promo(state: &AppState, user: &AuthUser, code: &str) -> AppResult<AppliedPromo> {
    let code = normalize_code(code);
    let promo = find_promo(&state.orm, &code, false).await?;
    let prior_uses = match &promo {
        Some(promo) => count_prior_uses(&state.orm, user.user_id, promo.id).await?,
        None => 0,
    };
    let cart = load_cart(&state.orm, user.user_id).await?;

    let applied = validate(
        promo.as_ref(),
        cart.total,
        prior_uses,
        state.config.checkout.promo_min_subtotal,
        Utc::now(),
    )?;
    Ok(applied)
}

pub(crate) async fn find_promo<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    for_update: bool,
) -> AppResult<Option<PromoCode>> {
    let mut finder = PromoCodes::find().filter(PromoCol::Code.eq(normalize_code(code)));
    if for_update {
        finder = finder.lock(LockType::Update);
    }
    Ok(finder.one(conn).await?.map(PromoCode::from))
}

/// Orders this customer already placed with the promo.
pub(crate) async fn count_prior_uses<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    promo_id: Uuid,
) -> AppResult<u64> {
    let uses = Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .filter(OrderCol::PromoCodeId.eq(promo_id))
        .count(conn)
        .await?;
    Ok(uses)
}

/// Advances the activation counter with a compare-and-swap on the count seen at
/// validation time, deactivating the code when it reaches its ceiling.
pub(crate) async fn consume_activation<C: ConnectionTrait>(
    conn: &C,
    promo: &PromoCode,
) -> AppResult<()> {
    let next = promo.activations_count + 1;
    let still_active = next < promo.max_activations;

    let result = PromoCodes::update_many()
        .col_expr(PromoCol::ActivationsCount, Expr::value(next))
        .col_expr(PromoCol::IsActive, Expr::value(still_active))
        .filter(PromoCol::Id.eq(promo.id))
        .filter(PromoCol::ActivationsCount.eq(promo.activations_count))
        .filter(PromoCol::IsActive.eq(true))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(PromoError::Exhausted.into());
    }
    if !still_active {
        tracing::info!(code = %promo.code, "promo code reached its activation ceiling");
    }
    Ok(())
}
