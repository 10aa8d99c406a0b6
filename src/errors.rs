//! Unified error types for the recurring-ledger engine.
//!
//! A single crate-wide [`Error`] enum keeps error handling uniform across the
//! store adapter, the core engine, and the host binary. Per-template failures
//! during a scan are isolated into the scan report; only whole-scan failures
//! (the store could not even be queried) surface as `Err` from `run_scan`.

use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying store error - transient store outages land here and are
    /// retried naturally by the next scheduled scan, never in-loop
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Malformed recurrence descriptor, rejected at template creation or
    /// update time
    #[error("Invalid recurrence descriptor: {message}")]
    InvalidDescriptor {
        /// What was wrong with the descriptor
        message: String,
    },

    /// Non-positive or non-finite monetary amount
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Template lookup by id found nothing
    #[error("Recurring template {id} not found")]
    TemplateNotFound {
        /// The missing template id
        id: i64,
    },

    /// Interval arithmetic left the representable date range; the affected
    /// template stays active so an operator can correct its descriptor
    #[error("Interval calculation overflowed the representable date range")]
    CalculationOverflow,

    /// Host configuration problem (environment variables, database URL)
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
