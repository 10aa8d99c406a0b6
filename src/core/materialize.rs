//! Occurrence materialization - turning one due template cycle into a
//! concrete ledger entry, exactly once.
//!
//! The idempotency guard is layered: a cheap existence pre-check on the
//! `(template_id, sequence_index)` key handles the common redundant-call
//! case, and the store's UNIQUE index on that key backstops the true race,
//! where two materializations pass the pre-check simultaneously. The loser of
//! that race is reported as [`MaterializationResult::AlreadyMaterialized`],
//! never as an error.

use crate::core::interval::{self, Recurrence};
use crate::entities::{occurrence, recurring_template};
use crate::errors::{Error, Result};
use crate::store;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::debug;

/// Outcome of one materialization attempt for one template.
#[derive(Debug)]
pub enum MaterializationResult {
    /// The template is inactive or its next cycle is not yet due
    NotDue,
    /// An occurrence for the expected sequence index already exists
    /// (redundant call, or a concurrent materialization won the race)
    AlreadyMaterialized,
    /// A new occurrence was written and the cursor advanced
    Created(occurrence::Model),
    /// This template could not be materialized (malformed stored descriptor,
    /// interval overflow); it is left unchanged for the next scan
    Failed(String),
}

/// Materializes the next occurrence of a template if it is due at `now`.
///
/// Algorithm:
/// 1. Inactive or not yet due: `NotDue`.
/// 2. `expected_index = occurrence_count + 1`.
/// 3. Existence pre-check on the idempotency key: `AlreadyMaterialized`.
/// 4. One transaction: insert the occurrence (payload snapshot,
///    `created_at = now`) and advance the cursor. The new `next_due_at` is
///    computed from the schedule anchor and the cycle count, never from
///    `now`, so late scans stay anchored to the original schedule instead of
///    drifting forward.
/// 5. A unique-key race loss is `AlreadyMaterialized`; a malformed descriptor
///    or overflow is `Failed`; any other store error propagates as `Err`.
pub async fn materialize_if_due(
    db: &DatabaseConnection,
    template: &recurring_template::Model,
    now: DateTime<Utc>,
) -> Result<MaterializationResult> {
    if !template.is_active || template.next_due_at > now {
        return Ok(MaterializationResult::NotDue);
    }

    let expected_index = template.occurrence_count + 1;

    if store::occurrences::exists(db, template.id, expected_index).await? {
        debug!(
            template_id = template.id,
            sequence_index = expected_index,
            "occurrence already materialized, skipping"
        );
        return Ok(MaterializationResult::AlreadyMaterialized);
    }

    let descriptor = match Recurrence::from_template(template) {
        Ok(descriptor) => descriptor,
        Err(err @ Error::InvalidDescriptor { .. }) => {
            return Ok(MaterializationResult::Failed(err.to_string()));
        }
        Err(err) => return Err(err),
    };

    // Cycle number of the occurrence after this one, relative to the anchor
    let next_cycle = expected_index - template.anchor_count + 1;
    let next_due_at = match interval::occurrence_instant(template.anchor_at, descriptor, next_cycle)
    {
        Ok(instant) => instant,
        Err(Error::CalculationOverflow) => {
            return Ok(MaterializationResult::Failed(
                Error::CalculationOverflow.to_string(),
            ));
        }
        Err(err) => return Err(err),
    };

    match store::occurrences::insert_and_advance(db, template, expected_index, now, next_due_at)
        .await?
    {
        store::occurrences::InsertOutcome::Inserted(created) => {
            debug!(
                template_id = template.id,
                sequence_index = expected_index,
                next_due_at = %next_due_at,
                "materialized occurrence"
            );
            Ok(MaterializationResult::Created(created))
        }
        store::occurrences::InsertOutcome::RaceLost => {
            debug!(
                template_id = template.id,
                sequence_index = expected_index,
                "lost materialization race, treating as already materialized"
            );
            Ok(MaterializationResult::AlreadyMaterialized)
        }
    }
}
