use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{DeliveryAddress, Order, OrderItem, OrderStatus},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddressFields {
    pub full_name: String,
    pub phone: String,
    pub city: String,
    pub street: String,
    pub building: String,
    pub apartment: Option<String>,
    pub postal_code: Option<String>,
    pub comment: Option<String>,
}

impl AddressFields {
    /// Trims every field, drops blank optionals and rejects blank required ones.
    /// Lengths are checked against the `delivery_addresses` columns, counted in characters.
    pub fn normalized(self) -> Result<Self, AppError> {
        fn within(field: &str, value: String, max: usize) -> Result<String, AppError> {
            if value.chars().count() > max {
                return Err(AppError::BadRequest(format!(
                    "{field} must be at most {max} characters"
                )));
            }
            Ok(value)
        }
        fn required(field: &str, value: String, max: usize) -> Result<String, AppError> {
            let value = value.trim().to_string();
            if value.is_empty() {
                return Err(AppError::BadRequest(format!("{field} is required")));
            }
            within(field, value, max)
        }
        fn optional(
            field: &str,
            value: Option<String>,
            max: usize,
        ) -> Result<Option<String>, AppError> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| within(field, v, max))
                .transpose()
        }

        Ok(Self {
            full_name: required("full_name", self.full_name, 200)?,
            phone: required("phone", self.phone, 20)?,
            city: required("city", self.city, 100)?,
            street: required("street", self.street, 255)?,
            building: required("building", self.building, 50)?,
            apartment: optional("apartment", self.apartment, 50)?,
            postal_code: optional("postal_code", self.postal_code, 20)?,
            comment: optional("comment", self.comment, usize::MAX)?,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub address: AddressFields,
    pub promo_code: Option<String>,
}

/// Result of a committed checkout.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlacedOrder {
    pub order_id: Uuid,
    pub order: OrderDetails,
    /// Set when a promo code was dropped under the degrade policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_warning: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub delivery_address: DeliveryAddress,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}
