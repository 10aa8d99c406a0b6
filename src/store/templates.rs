//! Template store operations - reads and user-driven row updates.
//!
//! Cursor fields (`occurrence_count`, `next_due_at`) are advanced exclusively
//! by `store::occurrences::insert_and_advance`; nothing in this module
//! touches them except `reanchor`, which is the explicit "fresh schedule"
//! path for descriptor edits.

use crate::entities::{RecurringTemplate, recurring_template};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};

/// Lists the active templates for one owner, the working set of a due scan.
pub async fn list_active<C>(db: &C, owner_id: &str) -> Result<Vec<recurring_template::Model>>
where
    C: ConnectionTrait,
{
    RecurringTemplate::find()
        .filter(recurring_template::Column::OwnerId.eq(owner_id))
        .filter(recurring_template::Column::IsActive.eq(true))
        .order_by_asc(recurring_template::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists all templates for one owner (active and paused), for display.
pub async fn list_for_owner<C>(db: &C, owner_id: &str) -> Result<Vec<recurring_template::Model>>
where
    C: ConnectionTrait,
{
    RecurringTemplate::find()
        .filter(recurring_template::Column::OwnerId.eq(owner_id))
        .order_by_asc(recurring_template::Column::Description)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a template by id.
pub async fn find_by_id<C>(db: &C, template_id: i64) -> Result<Option<recurring_template::Model>>
where
    C: ConnectionTrait,
{
    RecurringTemplate::find_by_id(template_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a template by id, failing with `TemplateNotFound` when absent.
pub async fn require<C>(db: &C, template_id: i64) -> Result<recurring_template::Model>
where
    C: ConnectionTrait,
{
    find_by_id(db, template_id)
        .await?
        .ok_or(Error::TemplateNotFound { id: template_id })
}

/// Toggles the lifecycle flag. Cursor state is untouched.
pub async fn set_active<C>(
    db: &C,
    template_id: i64,
    active: bool,
) -> Result<recurring_template::Model>
where
    C: ConnectionTrait,
{
    let template = require(db, template_id).await?;
    let mut model: recurring_template::ActiveModel = template.into();
    model.is_active = Set(active);
    model.update(db).await.map_err(Into::into)
}

/// Updates the payload columns of a template. Future occurrences snapshot the
/// new values; historical occurrences keep their own copies.
pub async fn update_payload<C>(
    db: &C,
    template_id: i64,
    description: String,
    amount: f64,
    category: Option<String>,
) -> Result<recurring_template::Model>
where
    C: ConnectionTrait,
{
    let template = require(db, template_id).await?;
    let mut model: recurring_template::ActiveModel = template.into();
    model.description = Set(description);
    model.amount = Set(amount);
    model.category = Set(category);
    model.update(db).await.map_err(Into::into)
}

/// Rewrites the descriptor columns and re-anchors the schedule.
///
/// `anchor_count` is pinned to the template's current `occurrence_count`, so
/// the sequence index keeps increasing and the `(template_id,
/// sequence_index)` idempotency key is never reused against historical rows.
pub async fn reanchor<C>(
    db: &C,
    template_id: i64,
    frequency: String,
    interval_amount: Option<i32>,
    interval_unit: Option<String>,
    anchor_at: DateTime<Utc>,
    next_due_at: DateTime<Utc>,
) -> Result<recurring_template::Model>
where
    C: ConnectionTrait,
{
    let template = require(db, template_id).await?;
    let anchor_count = template.occurrence_count;

    let mut model: recurring_template::ActiveModel = template.into();
    model.frequency = Set(frequency);
    model.interval_amount = Set(interval_amount);
    model.interval_unit = Set(interval_unit);
    model.anchor_at = Set(anchor_at);
    model.anchor_count = Set(anchor_count);
    model.next_due_at = Set(next_due_at);
    model.update(db).await.map_err(Into::into)
}

/// Hard-deletes a template. Its historical occurrences remain in the ledger.
pub async fn delete<C>(db: &C, template_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let template = require(db, template_id).await?;
    template.delete(db).await?;
    Ok(())
}
