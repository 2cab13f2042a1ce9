use std::{env, str::FromStr};

use rust_decimal::Decimal;

use crate::pricing::parse_amount;

/// What checkout does when the supplied promo code fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromoFailurePolicy {
    /// Reject the order with the specific promo error.
    #[default]
    Abort,
    /// Place the order at full price and report the promo error as a warning.
    Degrade,
}

impl FromStr for PromoFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "degrade" => Ok(Self::Degrade),
            other => Err(anyhow::anyhow!("unknown promo failure policy: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutPolicy {
    /// Subtotal a cart must reach before any promo code applies.
    pub promo_min_subtotal: Decimal,
    pub promo_failure: PromoFailurePolicy,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            promo_min_subtotal: Decimal::new(50000, 2),
            promo_failure: PromoFailurePolicy::Abort,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub checkout: CheckoutPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let checkout = CheckoutPolicy::from_vars(
            env::var("PROMO_MIN_ORDER_AMOUNT").ok().as_deref(),
            env::var("PROMO_FAILURE_POLICY").ok().as_deref(),
        )?;
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            checkout,
        })
    }
}

impl CheckoutPolicy {
    fn from_vars(min_amount: Option<&str>, failure: Option<&str>) -> anyhow::Result<Self> {
        let mut policy = Self::default();
        if let Some(raw) = min_amount {
            policy.promo_min_subtotal = parse_amount(raw)
                .ok_or_else(|| anyhow::anyhow!("PROMO_MIN_ORDER_AMOUNT is not a valid amount: {raw}"))?;
        }
        if let Some(raw) = failure {
            policy.promo_failure = raw.parse()?;
        }
        Ok(policy)
    }
}
