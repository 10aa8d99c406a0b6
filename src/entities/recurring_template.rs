//! Recurring template entity - Represents a repeating financial obligation.
//!
//! Each template carries a payload (description, amount, category), a
//! recurrence descriptor stored as plain columns, and a cursor
//! (`anchor_at`/`anchor_count`/`next_due_at`/`occurrence_count`) that the
//! materializer alone advances. The cursor fields are never patched by user
//! edits; a descriptor edit re-anchors the schedule instead.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recurring template database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_templates")]
pub struct Model {
    /// Unique identifier for the template
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner this template belongs to - every engine operation is scoped to
    /// one owner
    pub owner_id: String,
    /// Human-readable description of the obligation (e.g., "Office rent")
    pub description: String,
    /// Optional ledger category (e.g., "utilities")
    pub category: Option<String>,
    /// Amount charged per occurrence, always positive
    pub amount: f64,
    /// Recurrence frequency: `"daily"`, `"weekly"`, `"monthly"`, `"yearly"`,
    /// or `"custom"`
    pub frequency: String,
    /// Interval multiplier for `"custom"` frequency, positive; None otherwise
    pub interval_amount: Option<i32>,
    /// Interval unit for `"custom"` frequency: `"minutes"`, `"hours"`,
    /// `"days"`, `"weeks"`, `"months"`, or `"years"`; None otherwise
    pub interval_unit: Option<String>,
    /// Schedule anchor - due instants are computed as anchor plus a whole
    /// number of intervals, so calendar clamping never compounds
    pub anchor_at: DateTimeUtc,
    /// Value of `occurrence_count` when the anchor was last set (0 at
    /// creation, updated only by a descriptor edit)
    pub anchor_count: i64,
    /// When the next occurrence becomes due
    pub next_due_at: DateTimeUtc,
    /// How many occurrences have been materialized; only ever increases
    pub occurrence_count: i64,
    /// Whether the scan considers this template at all
    pub is_active: bool,
}

/// Defines relationships between `RecurringTemplate` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One template has many materialized occurrences
    #[sea_orm(has_many = "super::occurrence::Entity")]
    Occurrences,
}

impl Related<super::occurrence::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Occurrences.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
