//! Shared test utilities for the recurring-ledger engine.
//!
//! Provides the in-memory database setup every integration test uses, plus
//! factory helpers for templates with sensible defaults.

use crate::core::interval::Recurrence;
use crate::core::template::create_template;
use crate::entities::recurring_template;
use crate::errors::Result;
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables and the occurrence
/// uniqueness index initialized. This is the standard setup for all tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a UTC instant from date parts; seconds are always zero.
#[must_use]
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    #[allow(clippy::unwrap_used)] // test inputs are literal, valid dates
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .unwrap()
}

/// Creates a test template with sensible defaults.
///
/// # Defaults
/// * `amount`: 100.0
/// * `category`: `"operations"`
pub async fn create_test_template(
    db: &DatabaseConnection,
    owner_id: &str,
    description: &str,
    descriptor: Recurrence,
    start_at: DateTime<Utc>,
) -> Result<recurring_template::Model> {
    create_template(
        db,
        owner_id,
        description,
        100.0,
        Some("operations".to_string()),
        descriptor,
        start_at,
    )
    .await
}
