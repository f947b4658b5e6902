//! Database configuration module for `Fireline`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables and secondary indexes are generated from the entity definitions with
//! `Schema::create_table_from_entity` / `create_index_from_entity`, so the
//! database schema matches the Rust struct definitions without manual SQL. On
//! top of the per-column indexes, a composite `(status, delay_expires_at)`
//! index keeps the expiry sweep's candidate scan cheap.

use crate::config::settings::DatabaseSettings;
use crate::entities::{Order, OrderItem, OrderItemModifier, order_item};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::info;

/// Establishes a connection to the `SQLite` database.
///
/// The URL comes from the `DATABASE_URL` environment variable when set,
/// otherwise from the configured settings.
pub async fn create_connection(settings: &DatabaseSettings) -> Result<DatabaseConnection> {
    let database_url = settings.effective_url();
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables and indexes from the entity definitions, if missing.
///
/// Orders are created before order items, and order items before modifier
/// selections, so foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut order_table = schema.create_table_from_entity(Order);
    let mut order_item_table = schema.create_table_from_entity(OrderItem);
    let mut modifier_table = schema.create_table_from_entity(OrderItemModifier);

    db.execute(builder.build(order_table.if_not_exists()))
        .await?;
    db.execute(builder.build(order_item_table.if_not_exists()))
        .await?;
    db.execute(builder.build(modifier_table.if_not_exists()))
        .await?;

    for entity_indexes in [
        schema.create_index_from_entity(Order),
        schema.create_index_from_entity(OrderItem),
        schema.create_index_from_entity(OrderItemModifier),
    ] {
        for mut stmt in entity_indexes {
            db.execute(builder.build(stmt.if_not_exists())).await?;
        }
    }

    // Sweep scan index: all pending items with an elapsed deadline
    let sweep_index = Index::create()
        .if_not_exists()
        .name("idx_order_items_status_delay_expires_at")
        .table(order_item::Entity)
        .col(order_item::Column::Status)
        .col(order_item::Column::DelayExpiresAt)
        .to_owned();
    db.execute(builder.build(&sweep_index)).await?;

    info!("Database tables and indexes ensured.");
    Ok(())
}
