//! Template operations - the user-facing surface of the engine.
//!
//! Creation and edits validate synchronously, so a malformed descriptor or
//! amount never reaches the scan. Cursor state is off limits here: the
//! materializer alone advances it, and a descriptor edit re-anchors the
//! schedule instead of patching the live cursor.

use crate::core::interval::{self, Recurrence};
use crate::entities::recurring_template;
use crate::errors::{Error, Result};
use crate::store;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates a new recurring template.
///
/// The first occurrence is due one interval *after* `start_at`, not at
/// `start_at` itself - the expense starts today, the first charge lands after
/// the period.
pub async fn create_template(
    db: &DatabaseConnection,
    owner_id: &str,
    description: &str,
    amount: f64,
    category: Option<String>,
    descriptor: Recurrence,
    start_at: DateTime<Utc>,
) -> Result<recurring_template::Model> {
    let description = validated_description(description)?;
    validate_amount(amount)?;

    let next_due_at = interval::occurrence_instant(start_at, descriptor, 1)?;
    let (frequency, interval_amount, interval_unit) = descriptor.to_columns();

    let template = recurring_template::ActiveModel {
        owner_id: Set(owner_id.to_string()),
        description: Set(description),
        category: Set(category),
        amount: Set(amount),
        frequency: Set(frequency),
        interval_amount: Set(interval_amount),
        interval_unit: Set(interval_unit),
        anchor_at: Set(start_at),
        anchor_count: Set(0),
        next_due_at: Set(next_due_at),
        occurrence_count: Set(0),
        is_active: Set(true),
        ..Default::default()
    };

    template.insert(db).await.map_err(Into::into)
}

/// Toggles the lifecycle flag; has no effect on cursor state.
pub async fn set_active(
    db: &DatabaseConnection,
    template_id: i64,
    active: bool,
) -> Result<recurring_template::Model> {
    store::templates::set_active(db, template_id, active).await
}

/// Edits the payload of a template (description, amount, category).
///
/// Future occurrences snapshot the new values; historical occurrences and the
/// cursor are untouched.
pub async fn update_details(
    db: &DatabaseConnection,
    template_id: i64,
    description: &str,
    amount: f64,
    category: Option<String>,
) -> Result<recurring_template::Model> {
    let description = validated_description(description)?;
    validate_amount(amount)?;
    store::templates::update_payload(db, template_id, description, amount, category).await
}

/// Replaces a template's recurrence descriptor, re-anchoring the schedule at
/// `effective_at`.
///
/// The occurrence count is preserved and becomes the new anchor count, so
/// sequence indices keep increasing and never collide with historical rows.
/// The next occurrence is due one new interval after `effective_at`.
pub async fn update_descriptor(
    db: &DatabaseConnection,
    template_id: i64,
    descriptor: Recurrence,
    effective_at: DateTime<Utc>,
) -> Result<recurring_template::Model> {
    let next_due_at = interval::occurrence_instant(effective_at, descriptor, 1)?;
    let (frequency, interval_amount, interval_unit) = descriptor.to_columns();

    store::templates::reanchor(
        db,
        template_id,
        frequency,
        interval_amount,
        interval_unit,
        effective_at,
        next_due_at,
    )
    .await
}

/// Hard-deletes a template. Its materialized occurrences stay in the ledger.
pub async fn delete_template(db: &DatabaseConnection, template_id: i64) -> Result<()> {
    store::templates::delete(db, template_id).await
}

/// Lists all templates for one owner, for the presentation layer.
pub async fn list_templates(
    db: &DatabaseConnection,
    owner_id: &str,
) -> Result<Vec<recurring_template::Model>> {
    store::templates::list_for_owner(db, owner_id).await
}

fn validated_description(description: &str) -> Result<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(Error::Config {
            message: "template description cannot be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]
    use super::*;
    use crate::core::interval::IntervalUnit;
    use crate::core::materialize::{MaterializationResult, materialize_if_due};
    use crate::store::templates::require;
    use crate::test_utils::{create_test_template, setup_test_db, utc};

    #[tokio::test]
    async fn test_create_initializes_cursor() -> Result<()> {
        let db = setup_test_db().await?;
        let start = utc(2024, 1, 1, 0, 0);
        let template = create_template(
            &db,
            "owner-1",
            "  Office rent  ",
            1200.0,
            Some("rent".to_string()),
            Recurrence::Monthly,
            start,
        )
        .await?;

        assert_eq!(template.description, "Office rent");
        assert_eq!(template.occurrence_count, 0);
        assert_eq!(template.anchor_count, 0);
        assert_eq!(template.anchor_at, start);
        assert_eq!(template.next_due_at, utc(2024, 2, 1, 0, 0));
        assert!(template.is_active);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() -> Result<()> {
        let db = setup_test_db().await?;
        let start = utc(2024, 1, 1, 0, 0);

        let empty = create_template(&db, "o", "   ", 10.0, None, Recurrence::Daily, start).await;
        assert!(matches!(empty, Err(Error::Config { message: _ })));

        let negative =
            create_template(&db, "o", "Rent", -5.0, None, Recurrence::Daily, start).await;
        assert!(matches!(negative, Err(Error::InvalidAmount { amount: _ })));

        let nan = create_template(&db, "o", "Rent", f64::NAN, None, Recurrence::Daily, start).await;
        assert!(matches!(nan, Err(Error::InvalidAmount { amount: _ })));

        // A zero custom interval never even constructs a descriptor
        assert!(Recurrence::custom(0, IntervalUnit::Days).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_active_leaves_cursor_alone() -> Result<()> {
        let db = setup_test_db().await?;
        let start = utc(2024, 1, 1, 0, 0);
        let template =
            create_test_template(&db, "owner-1", "Rent", Recurrence::Daily, start).await?;

        let paused = set_active(&db, template.id, false).await?;
        assert!(!paused.is_active);
        assert_eq!(paused.next_due_at, template.next_due_at);
        assert_eq!(paused.occurrence_count, template.occurrence_count);

        let resumed = set_active(&db, template.id, true).await?;
        assert!(resumed.is_active);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_descriptor_reanchors_without_reusing_indices() -> Result<()> {
        let db = setup_test_db().await?;
        let start = utc(2024, 1, 1, 0, 0);
        let template =
            create_test_template(&db, "owner-1", "Rent", Recurrence::Daily, start).await?;

        // Materialize two daily occurrences first
        for day in [2u32, 3] {
            let current = require(&db, template.id).await?;
            let result = materialize_if_due(&db, &current, utc(2024, 1, day, 0, 0)).await?;
            assert!(matches!(result, MaterializationResult::Created(_)));
        }

        // Switch to weekly, effective Jan 10
        let effective = utc(2024, 1, 10, 0, 0);
        let updated = update_descriptor(&db, template.id, Recurrence::Weekly, effective).await?;

        assert_eq!(updated.frequency, "weekly");
        assert_eq!(updated.anchor_at, effective);
        assert_eq!(updated.anchor_count, 2);
        assert_eq!(updated.occurrence_count, 2);
        assert_eq!(updated.next_due_at, utc(2024, 1, 17, 0, 0));

        // The next materialized occurrence continues the sequence at 3
        let result = materialize_if_due(&db, &updated, utc(2024, 1, 17, 0, 0)).await?;
        let MaterializationResult::Created(created) = result else {
            panic!("expected Created, got {result:?}");
        };
        assert_eq!(created.sequence_index, 3);

        let reloaded = require(&db, template.id).await?;
        assert_eq!(reloaded.next_due_at, utc(2024, 1, 24, 0, 0));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_keeps_ledger_rows() -> Result<()> {
        let db = setup_test_db().await?;
        let start = utc(2024, 1, 1, 0, 0);
        let template =
            create_test_template(&db, "owner-1", "Rent", Recurrence::Daily, start).await?;

        let result = materialize_if_due(&db, &template, utc(2024, 1, 2, 0, 0)).await?;
        assert!(matches!(result, MaterializationResult::Created(_)));

        delete_template(&db, template.id).await?;
        assert!(store::templates::find_by_id(&db, template.id).await?.is_none());
        assert_eq!(
            crate::store::occurrences::count_for_template(&db, template.id).await?,
            1
        );

        let missing = delete_template(&db, template.id).await;
        assert!(matches!(missing, Err(Error::TemplateNotFound { id: _ })));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_templates_covers_paused_ones() -> Result<()> {
        let db = setup_test_db().await?;
        let start = utc(2024, 1, 1, 0, 0);
        let a = create_test_template(&db, "owner-1", "Rent", Recurrence::Monthly, start).await?;
        create_test_template(&db, "owner-1", "Power", Recurrence::Monthly, start).await?;
        create_test_template(&db, "owner-2", "Rent", Recurrence::Monthly, start).await?;
        set_active(&db, a.id, false).await?;

        let templates = list_templates(&db, "owner-1").await?;
        assert_eq!(templates.len(), 2);

        let active = store::templates::list_active(&db, "owner-1").await?;
        assert_eq!(active.len(), 1);
        Ok(())
    }
}
