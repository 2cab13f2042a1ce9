use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{
        categories::Model as CategoryModel, delivery_addresses::Model as DeliveryAddressModel,
        order_items::Model as OrderItemModel, orders::Model as OrderModel,
        products::Model as ProductModel, promo_codes::Model as PromoCodeModel,
        users::Model as UserModel,
    },
    pricing::from_cents,
};

pub use crate::entity::orders::OrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One cart row together with the product it points at.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub item_id: Uuid,
    pub product: Product,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    /// `None` until the user first adds something.
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub lines: Vec<CartLine>,
    pub total: Decimal,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromoCode {
    pub id: Uuid,
    pub code: String,
    pub discount_percent: i32,
    pub activations_count: i32,
    pub max_activations: i32,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_reusable: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subtotal_amount: Decimal,
    pub total_amount: Decimal,
    pub discount_percent: i32,
    pub promo_code_id: Option<Uuid>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryAddress {
    pub id: Uuid,
    pub order_id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub city: String,
    pub street: String,
    pub building: String,
    pub apartment: Option<String>,
    pub postal_code: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            surname: model.surname,
            email: model.email,
            phone: model.phone,
            address: model.address,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<CategoryModel> for Category {
    fn from(model: CategoryModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<ProductModel> for Product {
    fn from(model: ProductModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: from_cents(model.price_cents),
            stock_quantity: model.stock_quantity,
            image_url: model.image_url,
            category_id: model.category_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<PromoCodeModel> for PromoCode {
    fn from(model: PromoCodeModel) -> Self {
        Self {
            id: model.id,
            code: model.code,
            discount_percent: model.discount_percent,
            activations_count: model.activations_count,
            max_activations: model.max_activations,
            end_date: model.end_date.map(|dt| dt.with_timezone(&Utc)),
            is_active: model.is_active,
            is_reusable: model.is_reusable,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<OrderModel> for Order {
    fn from(model: OrderModel) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            subtotal_amount: from_cents(model.subtotal_cents),
            total_amount: from_cents(model.total_cents),
            discount_percent: model.discount_percent,
            promo_code_id: model.promo_code_id,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<OrderItemModel> for OrderItem {
    fn from(model: OrderItemModel) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            price_at_purchase: from_cents(model.price_at_purchase_cents),
        }
    }
}

impl From<DeliveryAddressModel> for DeliveryAddress {
    fn from(model: DeliveryAddressModel) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            full_name: model.full_name,
            phone: model.phone,
            city: model.city,
            street: model.street,
            building: model.building,
            apartment: model.apartment,
            postal_code: model.postal_code,
            comment: model.comment,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
