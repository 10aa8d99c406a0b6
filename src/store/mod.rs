//! Persistence adapter - the engine's only seam to the data store.
//!
//! Every function is generic over `sea_orm::ConnectionTrait` (or
//! `TransactionTrait` where it opens its own transaction), so the same code
//! runs against a live connection, inside an enclosing transaction, or
//! against the in-memory `SQLite` database the tests use.

/// Occurrence queries and the atomic insert-and-advance write
pub mod occurrences;
/// Recurring-template queries and user-driven row updates
pub mod templates;
