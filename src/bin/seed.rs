use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use storefront_api::{
    config::AppConfig,
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{categories, products, promo_codes, users},
    middleware::auth::{ROLE_ADMIN, ROLE_CUSTOMER, issue_token},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure the schema exists.
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin@example.com", "Ada", "Admin", "+7 900 000-00-01", ROLE_ADMIN).await?;
    let user_id = ensure_user(&orm, "user@example.com", "Carl", "Customer", "+7 900 000-00-02", ROLE_CUSTOMER).await?;
    seed_catalog(&orm).await?;
    ensure_promo(&orm, "WELCOME10", 10, 100).await?;

    let ttl = Duration::days(7);
    let admin_token = issue_token(&config.jwt_secret, admin_id, ROLE_ADMIN, ttl)?;
    let user_token = issue_token(&config.jwt_secret, user_id, ROLE_CUSTOMER, ttl)?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    println!("Admin token: {admin_token}");
    println!("User token: {user_token}");
    Ok(())
}

async fn ensure_user(
    orm: &OrmConn,
    email: &str,
    name: &str,
    surname: &str,
    phone: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?
    {
        return Ok(existing.id);
    }

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        surname: Set(surname.to_string()),
        email: Set(email.to_string()),
        phone: Set(phone.to_string()),
        address: Set(None),
        role: Set(role.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;
    Ok(user.id)
}

async fn ensure_category(orm: &OrmConn, name: &str) -> anyhow::Result<Uuid> {
    if let Some(existing) = categories::Entity::find()
        .filter(categories::Column::Name.eq(name))
        .one(orm)
        .await?
    {
        return Ok(existing.id);
    }

    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;
    Ok(category.id)
}

async fn seed_catalog(orm: &OrmConn) -> anyhow::Result<()> {
    let catalog = [
        ("Apparel", "Axum Hoodie", "Warm hoodie for Rustaceans", 550_000, 50),
        ("Kitchen", "Ferris Mug", "Coffee tastes better with Ferris", 120_000, 100),
        ("Stationery", "Rust Sticker Pack", "Decorate your laptop", 50_000, 200),
        ("Books", "E-book: Async Rust", "Learn async Rust patterns", 250_000, 75),
    ];

    // Prices in cents.
    for (category, name, description, price_cents, stock) in catalog {
        let category_id = ensure_category(orm, category).await?;
        let exists = products::Entity::find()
            .filter(products::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        products::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            price_cents: Set(price_cents),
            stock_quantity: Set(stock),
            image_url: Set(None),
            category_id: Set(Some(category_id)),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}

async fn ensure_promo(orm: &OrmConn, code: &str, discount_percent: i32, max_activations: i32) -> anyhow::Result<()> {
    let exists = promo_codes::Entity::find()
        .filter(promo_codes::Column::Code.eq(code))
        .one(orm)
        .await?
        .is_some();
    if exists {
        return Ok(());
    }

    promo_codes::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_string()),
        discount_percent: Set(discount_percent),
        activations_count: Set(0),
        max_activations: Set(max_activations),
        end_date: Set(None),
        is_active: Set(true),
        is_reusable: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;

    println!("Seeded promo code {code}");
    Ok(())
}
