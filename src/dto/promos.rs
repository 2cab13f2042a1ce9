use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::PromoCode;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidatePromoRequest {
    pub code: String,
}

/// A promo code that passed validation against a cart subtotal.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AppliedPromo {
    pub promo_id: Uuid,
    pub code: String,
    pub discount_percent: i32,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub discounted_total: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePromoRequest {
    pub code: String,
    pub discount_percent: i32,
    pub max_activations: i32,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_reusable")]
    pub is_reusable: bool,
}

fn default_reusable() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PromoList {
    pub items: Vec<PromoCode>,
}
