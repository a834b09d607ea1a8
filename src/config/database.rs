//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. The shipment natural key
//! `(bl_number, container_number, batch)` gets its own unique index here; the persistence
//! layer is the only place that uniqueness is enforced.

use crate::entities::{Person, Sale, Shipment, shipment};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Default location of the `SQLite` database file.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/shipment_registry.sqlite?mode=rwc";

/// Name of the unique index on the shipment natural key.
pub const SHIPMENT_NATURAL_KEY_INDEX: &str = "idx_shipments_bl_container_batch";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection using the `DATABASE_URL` environment variable.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    tracing::debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates the shipment, people and sales tables plus the natural-key index.
///
/// Every statement uses `IF NOT EXISTS`, so this is safe to run on each startup.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut shipment_table = schema.create_table_from_entity(Shipment);
    let mut person_table = schema.create_table_from_entity(Person);
    let mut sale_table = schema.create_table_from_entity(Sale);

    shipment_table.if_not_exists();
    person_table.if_not_exists();
    sale_table.if_not_exists();

    db.execute(builder.build(&shipment_table)).await?;
    db.execute(builder.build(&person_table)).await?;
    db.execute(builder.build(&sale_table)).await?;

    let natural_key = Index::create()
        .name(SHIPMENT_NATURAL_KEY_INDEX)
        .table(Shipment)
        .col(shipment::Column::BlNumber)
        .col(shipment::Column::ContainerNumber)
        .col(shipment::Column::Batch)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&natural_key)).await?;

    Ok(())
}
