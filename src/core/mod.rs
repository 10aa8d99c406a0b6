//! Core engine logic - framework-agnostic and host-agnostic.
//!
//! The host (a timer tick, a manual refresh, an app-start check) calls into
//! this layer; nothing in here owns a timer or a UI concern.

/// Pure schedule arithmetic and the recurrence descriptor type
pub mod interval;
/// Turning one due template cycle into an occurrence, exactly once
pub mod materialize;
/// The due scan over all of an owner's active templates
pub mod scan;
/// User-facing template operations: create, toggle, edit, delete, list
pub mod template;
