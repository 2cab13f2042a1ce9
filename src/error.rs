use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::response::{ApiResponse, Meta};

/// Why a promo code could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromoError {
    #[error("Promo code is invalid or inactive")]
    Invalid,

    #[error("Promo code has expired")]
    Expired,

    #[error("Promo code has no activations left")]
    Exhausted,

    #[error("Promo code was already used by this customer")]
    AlreadyUsed,

    #[error("Order subtotal must be at least {minimum} to use a promo code")]
    BelowMinimum { minimum: Decimal },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Transaction,
    Unauthorized,
    Forbidden,
    Internal,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Invalid cart action {0}")]
    InvalidAction(String),

    #[error("A valid phone number is required to place an order")]
    InvalidPhone,

    #[error("Unauthorized {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Product {0} is unavailable")]
    ProductUnavailable(Uuid),

    #[error("Cart item {0} not found")]
    ItemNotFound(Uuid),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient stock for {product}: only {available} available")]
    InsufficientStock { product: String, available: i32 },

    #[error(transparent)]
    Promo(#[from] PromoError),

    #[error("Transaction error")]
    Transaction(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::BadRequest(_) | AppError::InvalidAction(_) | AppError::InvalidPhone => {
                ErrorKind::Validation
            }
            AppError::NotFound | AppError::ProductUnavailable(_) | AppError::ItemNotFound(_) => {
                ErrorKind::NotFound
            }
            AppError::EmptyCart | AppError::InsufficientStock { .. } | AppError::Promo(_) => {
                ErrorKind::Conflict
            }
            AppError::Transaction(_) => ErrorKind::Transaction,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Forbidden => ErrorKind::Forbidden,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_location: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = match kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Transaction | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self {
            AppError::Transaction(err) => tracing::error!(error = %err, "transaction failed"),
            AppError::Internal(err) => tracing::error!(error = %err, "internal error"),
            _ => {}
        }

        // Stock and promo conflicts send the customer back to fix the cart.
        let retry_location = (kind == ErrorKind::Conflict).then_some("/api/cart");

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
                kind,
                retry_location,
            }),
            meta: Some(Meta::empty()),
            warning: None,
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
