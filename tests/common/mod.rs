#![allow(dead_code)]

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use storefront_api::{
    config::{AppConfig, CheckoutPolicy},
    db::{create_orm_conn, create_schema},
    dto::orders::{AddressFields, CheckoutRequest},
    entity::{categories, products, promo_codes, users},
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_CUSTOMER},
    pricing::to_cents,
    state::AppState,
};
use uuid::Uuid;

pub const VALID_PHONE: &str = "+7 912 345-67-89";

pub fn dec(raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap()
}

pub async fn test_state() -> AppState {
    test_state_with(CheckoutPolicy::default()).await
}

/// Fresh in-memory database per call.
pub async fn test_state_with(checkout: CheckoutPolicy) -> AppState {
    let orm = create_orm_conn("sqlite::memory:").await.unwrap();
    create_schema(&orm).await.unwrap();
    let config = AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        checkout,
    };
    AppState::new(orm, config)
}

async fn insert_user(state: &AppState, phone: &str, role: &str) -> Uuid {
    let id = Uuid::new_v4();
    users::ActiveModel {
        id: Set(id),
        name: Set("Test".into()),
        surname: Set("User".into()),
        email: Set(format!("{id}@example.com")),
        phone: Set(phone.into()),
        address: Set(None),
        role: Set(role.into()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .unwrap();
    id
}

pub async fn customer(state: &AppState) -> AuthUser {
    customer_with_phone(state, VALID_PHONE).await
}

pub async fn customer_with_phone(state: &AppState, phone: &str) -> AuthUser {
    AuthUser::customer(insert_user(state, phone, ROLE_CUSTOMER).await)
}

pub async fn admin(state: &AppState) -> AuthUser {
    AuthUser::admin(insert_user(state, VALID_PHONE, ROLE_ADMIN).await)
}

pub async fn category(state: &AppState, name: &str) -> Uuid {
    categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .unwrap()
    .id
}

pub async fn product(state: &AppState, name: &str, price: &str, stock: i32) -> Uuid {
    product_in(state, name, price, stock, None).await
}

pub async fn product_in(
    state: &AppState,
    name: &str,
    price: &str,
    stock: i32,
    category_id: Option<Uuid>,
) -> Uuid {
    products::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        description: Set(Some(format!("{name} description"))),
        price_cents: Set(to_cents(dec(price)).unwrap()),
        stock_quantity: Set(stock),
        image_url: Set(None),
        category_id: Set(category_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .unwrap()
    .id
}

pub async fn stock_of(state: &AppState, id: Uuid) -> i32 {
    products::Entity::find_by_id(id)
        .one(&state.orm)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}

pub struct PromoSeed {
    pub code: &'static str,
    pub discount_percent: i32,
    pub max_activations: i32,
    pub is_reusable: bool,
    pub end_date: Option<DateTime<Utc>>,
}

impl Default for PromoSeed {
    fn default() -> Self {
        Self {
            code: "SAVE10",
            discount_percent: 10,
            max_activations: 100,
            is_reusable: true,
            end_date: None,
        }
    }
}

pub async fn promo(state: &AppState, seed: PromoSeed) -> Uuid {
    promo_codes::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(seed.code.into()),
        discount_percent: Set(seed.discount_percent),
        activations_count: Set(0),
        max_activations: Set(seed.max_activations),
        end_date: Set(seed.end_date.map(Into::into)),
        is_active: Set(true),
        is_reusable: Set(seed.is_reusable),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .unwrap()
    .id
}

pub async fn promo_row(state: &AppState, id: Uuid) -> promo_codes::Model {
    promo_codes::Entity::find_by_id(id)
        .one(&state.orm)
        .await
        .unwrap()
        .unwrap()
}

pub fn address() -> AddressFields {
    AddressFields {
        full_name: "Ivan Petrov".into(),
        phone: VALID_PHONE.into(),
        city: "Kazan".into(),
        street: "Baumana".into(),
        building: "7".into(),
        apartment: Some("12".into()),
        postal_code: None,
        comment: None,
    }
}

pub fn checkout(promo_code: Option<&str>) -> CheckoutRequest {
    CheckoutRequest {
        address: address(),
        promo_code: promo_code.map(str::to_string),
    }
}
