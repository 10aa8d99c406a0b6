//! Database configuration module for the recurring-ledger engine.
//!
//! This module handles `SQLite` database connection and table creation using
//! `SeaORM`. Tables are generated from the entity definitions via
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without manual SQL. On top of the generated tables it creates the
//! one piece of schema the engine's correctness depends on: the UNIQUE index
//! on `occurrences (template_id, sequence_index)`. That constraint, not the
//! in-process scan guard, is what makes materialization safe under
//! concurrent triggers.

use crate::entities::{Occurrence, RecurringTemplate, occurrence};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Name of the uniqueness index backing the `(template_id, sequence_index)`
/// idempotency key.
pub const OCCURRENCE_IDEMPOTENCY_INDEX: &str = "ux_occurrences_template_sequence";

/// Gets the database URL from environment variable or returns default
/// `SQLite` path.
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/recurring_ledger.sqlite".to_string())
}

/// Establishes a connection to the `SQLite` database using the
/// `DATABASE_URL` environment variable.
///
/// Falls back to a default local `SQLite` file if no environment variable is
/// set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url())
        .await
        .map_err(Into::into)
}

/// Creates all necessary database tables and the occurrence uniqueness index.
///
/// Uses `SeaORM`'s schema generation from the entity definitions, then adds
/// the composite UNIQUE index that enforces the idempotency invariant: at
/// most one occurrence per `(template_id, sequence_index)` pair.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let template_table = schema.create_table_from_entity(RecurringTemplate);
    let occurrence_table = schema.create_table_from_entity(Occurrence);

    db.execute(builder.build(&template_table)).await?;
    db.execute(builder.build(&occurrence_table)).await?;

    let idempotency_index = Index::create()
        .name(OCCURRENCE_IDEMPOTENCY_INDEX)
        .table(Occurrence)
        .col(occurrence::Column::TemplateId)
        .col(occurrence::Column::SequenceIndex)
        .unique()
        .if_not_exists()
        .to_owned();

    db.execute(builder.build(&idempotency_index)).await?;

    Ok(())
}
