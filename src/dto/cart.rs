use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppError, models::CartLine};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    /// `increment` or `decrement`.
    pub action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    Increment,
    Decrement,
}

impl FromStr for CartAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increment" => Ok(Self::Increment),
            "decrement" => Ok(Self::Decrement),
            other => Err(AppError::InvalidAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CartUpdateOutcome {
    Incremented,
    Decremented,
    Removed,
    /// Increment refused because the cart already holds all available stock.
    StockLimitReached,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemUpdate {
    /// `None` once the line has been removed.
    pub item: Option<CartLine>,
    pub outcome: CartUpdateOutcome,
}

impl CartItemUpdate {
    pub fn warning(&self) -> Option<String> {
        match self.outcome {
            CartUpdateOutcome::StockLimitReached => {
                Some("Not enough stock to add another unit".to_string())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartTotal {
    pub total: rust_decimal::Decimal,
}
