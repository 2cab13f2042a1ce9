use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, Schema,
    sea_query::Index,
};

use crate::entity::{
    AuditLogs, CartItems, Carts, Categories, DeliveryAddresses, OrderItems, Orders, Products,
    PromoCodes, Users, cart_items,
};

pub type OrmConn = DatabaseConnection;

/// Create a SeaORM connection.
///
/// An in-memory SQLite database lives inside a single connection, so the pool is
/// pinned to exactly one; concurrent transactions then queue on the pool.
pub async fn create_orm_conn(database_url: &str) -> Result<OrmConn> {
    let mut options = ConnectOptions::new(database_url);
    options.sqlx_logging(false);
    if database_url.starts_with("sqlite::memory:") {
        options.max_connections(1).min_connections(1);
    }
    let conn = Database::connect(options).await?;
    Ok(conn)
}

/// Postgres gets the versioned SQL in `migrations/`; anything else gets a schema
/// derived from the entities.
pub async fn run_migrations(conn: &OrmConn) -> Result<()> {
    match conn.get_database_backend() {
        DbBackend::Postgres => {
            sqlx::migrate!("./migrations")
                .run(conn.get_postgres_connection_pool())
                .await?;
        }
        _ => create_schema(conn).await?,
    }
    Ok(())
}

pub async fn create_schema(conn: &OrmConn) -> Result<()> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    let tables = [
        schema.create_table_from_entity(Users),
        schema.create_table_from_entity(Categories),
        schema.create_table_from_entity(Products),
        schema.create_table_from_entity(Carts),
        schema.create_table_from_entity(CartItems),
        schema.create_table_from_entity(PromoCodes),
        schema.create_table_from_entity(Orders),
        schema.create_table_from_entity(OrderItems),
        schema.create_table_from_entity(DeliveryAddresses),
        schema.create_table_from_entity(AuditLogs),
    ];
    for mut table in tables {
        table.if_not_exists();
        conn.execute(backend.build(&table)).await?;
    }

    let one_line_per_product = Index::create()
        .name("idx_cart_items_cart_product")
        .table(CartItems)
        .col(cart_items::Column::CartId)
        .col(cart_items::Column::ProductId)
        .unique()
        .if_not_exists()
        .to_owned();
    conn.execute(backend.build(&one_line_per_product)).await?;

    Ok(())
}
