//! `RecurringLedger` - materialization engine for recurring expenses
//!
//! This crate turns user-defined recurring-expense templates (rent, utilities,
//! salaries) into concrete, dated, one-time ledger entries ("occurrences"),
//! advancing a per-template cursor each time. The engine is driven by an
//! external trigger (a timer tick, a manual refresh, an app-start check) that
//! may fire concurrently or redundantly; a per-owner single-flight guard plus
//! a store-level uniqueness constraint guarantee every due occurrence is
//! materialized exactly once.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    unsafe_code,
    unsafe_op_in_unsafe_fn,
    unreachable_code,
    unreachable_patterns,
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
#![warn(
    missing_docs,

    clippy::all,
    clippy::pedantic,
    clippy::nursery,

    clippy::inefficient_to_string,
    clippy::large_types_passed_by_value,
    clippy::needless_pass_by_value,

    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,

    clippy::cognitive_complexity,
    clippy::large_enum_variant,
    clippy::match_same_arms,

    clippy::enum_glob_use,
    clippy::must_use_candidate,
    clippy::redundant_closure_for_method_calls,
    clippy::semicolon_if_nothing_returned,
    clippy::wildcard_imports,

    future_incompatible,
    rust_2018_idioms,
)]
#![allow(
    clippy::module_name_repetitions,  // Common pattern in Rust
    clippy::missing_errors_doc,        // Will add gradually
    clippy::missing_panics_doc,        // Will add gradually
)]

/// Configuration management for database and host settings
pub mod config;
/// Core engine logic - interval math, materialization, due scans, template ops
pub mod core;
/// SeaORM entity definitions for database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// Persistence adapter - template and occurrence queries over a connection
pub mod store;

#[cfg(test)]
pub mod test_utils;
