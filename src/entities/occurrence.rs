//! Occurrence entity - An immutable one-time ledger entry materialized from a
//! recurring template for one specific due cycle.
//!
//! The payload is a snapshot taken at materialization time, so later template
//! edits never retroactively change historical entries. The pair
//! `(template_id, sequence_index)` is the idempotency key: a UNIQUE index on
//! it (created in `config::database::create_tables`) is the backstop that
//! makes concurrent double-firing impossible.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Occurrence database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "occurrences")]
pub struct Model {
    /// Unique identifier for the occurrence
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The template this occurrence was materialized from
    pub template_id: i64,
    /// 1-based occurrence number within the template's schedule
    pub sequence_index: i64,
    /// Description snapshot copied from the template
    pub description: String,
    /// Amount snapshot copied from the template
    pub amount: f64,
    /// Category snapshot copied from the template
    pub category: Option<String>,
    /// When the occurrence was materialized
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Occurrence and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each occurrence belongs to one recurring template
    #[sea_orm(
        belongs_to = "super::recurring_template::Entity",
        from = "Column::TemplateId",
        to = "super::recurring_template::Column::Id"
    )]
    RecurringTemplate,
}

impl Related<super::recurring_template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringTemplate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
