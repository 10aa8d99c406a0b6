//! Occurrence store operations, including the one atomic write the whole
//! design hinges on.
//!
//! [`insert_and_advance`] inserts a new occurrence and advances its
//! template's cursor inside a single transaction. The UNIQUE index on
//! `(template_id, sequence_index)` rejects a racing duplicate insert; that
//! rejection is classified as a lost race (`InsertOutcome::RaceLost`), not an
//! error, and the losing transaction is rolled back leaving the winner's rows
//! untouched.

use crate::entities::{Occurrence, occurrence, recurring_template};
use crate::errors::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

/// Outcome of the atomic insert-and-advance write.
#[derive(Debug)]
pub enum InsertOutcome {
    /// The occurrence was written and the cursor advanced
    Inserted(occurrence::Model),
    /// A concurrent materialization won the unique-key race; nothing was
    /// written by this call
    RaceLost,
}

/// Checks whether an occurrence already exists for the idempotency key
/// `(template_id, sequence_index)`.
///
/// This is the materializer's fast-path guard. It deliberately matches on the
/// unique key alone - never on description text or a time window, which
/// legitimate near-duplicate descriptions or slow ticks would defeat.
pub async fn exists<C>(db: &C, template_id: i64, sequence_index: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let count = Occurrence::find()
        .filter(occurrence::Column::TemplateId.eq(template_id))
        .filter(occurrence::Column::SequenceIndex.eq(sequence_index))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Counts the occurrences materialized from one template.
pub async fn count_for_template<C>(db: &C, template_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    Occurrence::find()
        .filter(occurrence::Column::TemplateId.eq(template_id))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Lists the most recently materialized occurrences for one template,
/// newest first.
pub async fn recent_for_template<C>(
    db: &C,
    template_id: i64,
    limit: u64,
) -> Result<Vec<occurrence::Model>>
where
    C: ConnectionTrait,
{
    Occurrence::find()
        .filter(occurrence::Column::TemplateId.eq(template_id))
        .order_by_desc(occurrence::Column::SequenceIndex)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Atomically inserts an occurrence and advances its template's cursor.
///
/// Within one transaction: insert the occurrence (payload snapshotted from
/// the template), set `occurrence_count = sequence_index`, set `next_due_at`.
/// A unique-key violation on the insert means a concurrent materialization
/// already wrote this cycle; the transaction is rolled back and the call
/// reports [`InsertOutcome::RaceLost`]. Any other store error propagates.
pub async fn insert_and_advance<C>(
    db: &C,
    template: &recurring_template::Model,
    sequence_index: i64,
    created_at: DateTime<Utc>,
    next_due_at: DateTime<Utc>,
) -> Result<InsertOutcome>
where
    C: TransactionTrait,
{
    let txn = db.begin().await?;

    let new_occurrence = occurrence::ActiveModel {
        template_id: Set(template.id),
        sequence_index: Set(sequence_index),
        description: Set(template.description.clone()),
        amount: Set(template.amount),
        category: Set(template.category.clone()),
        created_at: Set(created_at),
        ..Default::default()
    };

    let inserted = match new_occurrence.insert(&txn).await {
        Ok(model) => model,
        Err(err) => {
            return if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                txn.rollback().await?;
                Ok(InsertOutcome::RaceLost)
            } else {
                Err(err.into())
            };
        }
    };

    let mut cursor: recurring_template::ActiveModel = template.clone().into();
    cursor.occurrence_count = Set(sequence_index);
    cursor.next_due_at = Set(next_due_at);
    cursor.update(&txn).await?;

    txn.commit().await?;

    Ok(InsertOutcome::Inserted(inserted))
}
