//! Due-scan scheduling - one pass over an owner's active templates.
//!
//! The scan is `Idle -> Running -> Idle`: a per-owner single-flight guard
//! turns re-entrant invocation while running into a no-op (the scan already
//! in flight observes the same due templates). The guard is an in-process
//! efficiency measure only; correctness against overlapping scans from other
//! processes or devices rests on the store's uniqueness constraint, which the
//! materializer already treats as the final backstop.

use crate::core::materialize::{MaterializationResult, materialize_if_due};
use crate::errors::Result;
use crate::store;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

/// Per-owner single-flight guard. Clone handles share the same guard state.
#[derive(Debug, Default, Clone)]
pub struct ScanGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ScanGuard {
    /// Creates a fresh guard with no scans in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tries to mark a scan as running for `owner_id`.
    ///
    /// Returns `None` when a scan for that owner is already in flight. The
    /// returned permit releases the owner on drop, on every exit path.
    pub fn try_acquire(&self, owner_id: &str) -> Option<ScanPermit> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if in_flight.insert(owner_id.to_string()) {
            Some(ScanPermit {
                owner_id: owner_id.to_string(),
                in_flight: Arc::clone(&self.in_flight),
            })
        } else {
            None
        }
    }
}

/// RAII permit for one running scan; releases its owner slot on drop.
#[derive(Debug)]
pub struct ScanPermit {
    owner_id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Drop for ScanPermit {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.owner_id);
    }
}

/// Aggregated outcome of one due scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Number of active templates examined
    pub attempted: usize,
    /// Occurrences created in this pass (a template several intervals behind
    /// contributes several)
    pub created: usize,
    /// Cycles found already materialized (redundant call or lost race)
    pub already_materialized: usize,
    /// Templates that failed, with the reason; they are left unchanged and
    /// retried by the next scan
    pub failed: Vec<(i64, String)>,
    /// True when this invocation was a no-op because a scan for the owner
    /// was already in flight
    pub already_running: bool,
}

/// Runs one due scan for an owner: lists active templates, materializes every
/// due cycle of each, and isolates per-template failures.
///
/// A failure to list the templates at all fails the whole scan; everything
/// after that is recorded in the report, never thrown. Each template is
/// caught up completely in this pass - a template three intervals behind
/// yields three occurrences, each anchored to the original schedule.
pub async fn run_scan(
    db: &DatabaseConnection,
    guard: &ScanGuard,
    owner_id: &str,
    now: DateTime<Utc>,
) -> Result<ScanReport> {
    let Some(_permit) = guard.try_acquire(owner_id) else {
        info!(owner_id, "scan already in flight, skipping");
        return Ok(ScanReport {
            already_running: true,
            ..ScanReport::default()
        });
    };

    let templates = store::templates::list_active(db, owner_id).await?;

    let mut report = ScanReport {
        attempted: templates.len(),
        ..ScanReport::default()
    };

    for template in templates {
        catch_up_template(db, template, now, &mut report).await;
    }

    if report.failed.is_empty() {
        info!(
            owner_id,
            attempted = report.attempted,
            created = report.created,
            already_materialized = report.already_materialized,
            "scan complete"
        );
    } else {
        warn!(
            owner_id,
            attempted = report.attempted,
            created = report.created,
            failed = report.failed.len(),
            "scan complete with failures"
        );
    }

    Ok(report)
}

/// Materializes every due cycle of one template, re-fetching the advanced
/// cursor after each write. Failures are recorded, never propagated - the
/// remaining templates of the scan still run.
async fn catch_up_template(
    db: &DatabaseConnection,
    mut template: crate::entities::recurring_template::Model,
    now: DateTime<Utc>,
    report: &mut ScanReport,
) {
    loop {
        let template_id = template.id;
        let seen_count = template.occurrence_count;

        match materialize_if_due(db, &template, now).await {
            Ok(MaterializationResult::NotDue) => break,
            Ok(MaterializationResult::Created(_)) => report.created += 1,
            Ok(MaterializationResult::AlreadyMaterialized) => report.already_materialized += 1,
            Ok(MaterializationResult::Failed(reason)) => {
                report.failed.push((template_id, reason));
                break;
            }
            Err(err) => {
                report.failed.push((template_id, err.to_string()));
                break;
            }
        }

        // Pick up the advanced cursor (ours, or a concurrent winner's)
        match store::templates::find_by_id(db, template_id).await {
            Ok(Some(reloaded)) => {
                if reloaded.occurrence_count == seen_count {
                    // No progress despite Created/AlreadyMaterialized means
                    // our snapshot is stale in a way a refetch cannot fix;
                    // leave the rest for the next scan rather than spin
                    break;
                }
                template = reloaded;
            }
            Ok(None) => break, // deleted mid-scan
            Err(err) => {
                report.failed.push((template_id, err.to_string()));
                break;
            }
        }
    }
}

/// Formats a scan report into a human-readable summary string, useful for
/// logs or an operator surface.
#[must_use]
pub fn format_scan_summary(owner_id: &str, report: &ScanReport) -> String {
    if report.already_running {
        return format!("Due scan for {owner_id}: skipped, already running");
    }

    let mut summary = format!(
        "Due scan for {owner_id}: {} templates, {} created, {} already materialized",
        report.attempted, report.created, report.already_materialized
    );

    for (template_id, reason) in &report.failed {
        // write! to a String is infallible
        let _ = write!(summary, "\n  template {template_id} failed: {reason}");
    }

    summary
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::interval::Recurrence;
    use crate::store::templates::require;
    use crate::test_utils::{create_test_template, setup_test_db, utc};
    use sea_orm::{ActiveModelTrait, Set};

    #[tokio::test]
    async fn test_scan_of_empty_owner_is_empty() -> Result<()> {
        let db = setup_test_db().await?;
        let guard = ScanGuard::new();

        let report = run_scan(&db, &guard, "owner-1", utc(2024, 1, 1, 0, 0)).await?;
        assert_eq!(report.attempted, 0);
        assert_eq!(report.created, 0);
        assert!(report.failed.is_empty());
        assert!(!report.already_running);
        Ok(())
    }

    #[tokio::test]
    async fn test_anchoring_three_missed_intervals_catch_up_in_one_pass() -> Result<()> {
        let db = setup_test_db().await?;
        let guard = ScanGuard::new();
        let start = utc(2024, 1, 1, 0, 0);
        let template =
            create_test_template(&db, "owner-1", "Rent", Recurrence::Daily, start).await?;

        // No scan ran for three intervals; one pass creates all three
        let report = run_scan(&db, &guard, "owner-1", utc(2024, 1, 4, 0, 0)).await?;
        assert_eq!(report.attempted, 1);
        assert_eq!(report.created, 3);
        assert!(report.failed.is_empty());

        let occurrences =
            crate::store::occurrences::recent_for_template(&db, template.id, 10).await?;
        assert_eq!(occurrences.len(), 3);
        assert_eq!(occurrences[0].sequence_index, 3);
        assert_eq!(occurrences[0].created_at, utc(2024, 1, 4, 0, 0));
        assert_eq!(occurrences[2].sequence_index, 1);

        // Next due computed from the schedule anchor, not from "now"
        let reloaded = require(&db, template.id).await?;
        assert_eq!(reloaded.occurrence_count, 3);
        assert_eq!(reloaded.next_due_at, utc(2024, 1, 5, 0, 0));
        Ok(())
    }

    #[tokio::test]
    async fn test_scan_scopes_to_one_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let guard = ScanGuard::new();
        let start = utc(2024, 1, 1, 0, 0);
        create_test_template(&db, "owner-1", "Rent", Recurrence::Daily, start).await?;
        let other =
            create_test_template(&db, "owner-2", "Rent", Recurrence::Daily, start).await?;

        let report = run_scan(&db, &guard, "owner-1", utc(2024, 1, 2, 0, 0)).await?;
        assert_eq!(report.attempted, 1);
        assert_eq!(report.created, 1);

        // The other owner's template was never touched
        let untouched = require(&db, other.id).await?;
        assert_eq!(untouched.occurrence_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_isolation_middle_template_fails() -> Result<()> {
        let db = setup_test_db().await?;
        let guard = ScanGuard::new();
        let start = utc(2024, 1, 1, 0, 0);

        let first =
            create_test_template(&db, "owner-1", "Rent", Recurrence::Daily, start).await?;
        let second =
            create_test_template(&db, "owner-1", "Power", Recurrence::Daily, start).await?;
        let third =
            create_test_template(&db, "owner-1", "Water", Recurrence::Daily, start).await?;

        // Corrupt the middle template's stored descriptor
        let mut corrupt: crate::entities::recurring_template::ActiveModel = second.into();
        corrupt.frequency = Set("custom".to_string());
        corrupt.interval_amount = Set(None);
        corrupt.interval_unit = Set(None);
        let second = corrupt.update(&db).await?;

        let report = run_scan(&db, &guard, "owner-1", utc(2024, 1, 2, 0, 0)).await?;
        assert_eq!(report.attempted, 3);
        assert_eq!(report.created, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, second.id);

        assert_eq!(require(&db, first.id).await?.occurrence_count, 1);
        assert_eq!(require(&db, second.id).await?.occurrence_count, 0);
        assert_eq!(require(&db, third.id).await?.occurrence_count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_single_flight_reentry_is_a_no_op() -> Result<()> {
        let db = setup_test_db().await?;
        let guard = ScanGuard::new();

        // Simulate a scan in flight for owner-1
        let permit = guard.try_acquire("owner-1").unwrap();

        let report = run_scan(&db, &guard, "owner-1", utc(2024, 1, 1, 0, 0)).await?;
        assert!(report.already_running);
        assert_eq!(report.attempted, 0);

        // A different owner is unaffected
        let other = run_scan(&db, &guard, "owner-2", utc(2024, 1, 1, 0, 0)).await?;
        assert!(!other.already_running);

        // Releasing the permit lets the owner scan again
        drop(permit);
        let after = run_scan(&db, &guard, "owner-1", utc(2024, 1, 1, 0, 0)).await?;
        assert!(!after.already_running);
        Ok(())
    }

    #[tokio::test]
    async fn test_scenario_c_concurrent_scans_create_exactly_one() -> Result<()> {
        let db = setup_test_db().await?;
        let guard = ScanGuard::new();
        let start = utc(2024, 1, 1, 0, 0);
        let descriptor = Recurrence::custom(3, crate::core::interval::IntervalUnit::Hours)?;
        let template = create_test_template(&db, "owner-1", "Meter", descriptor, start).await?;

        let now = utc(2024, 1, 1, 3, 0);
        let (a, b) = tokio::join!(
            run_scan(&db, &guard, "owner-1", now),
            run_scan(&db, &guard, "owner-1", now),
        );
        let (a, b) = (a?, b?);

        // One scan did the work; the other was either skipped by the guard
        // or found the cycle already materialized
        assert_eq!(a.created + b.created, 1);
        assert_eq!(
            crate::store::occurrences::count_for_template(&db, template.id).await?,
            1
        );
        let occurrence = crate::store::occurrences::recent_for_template(&db, template.id, 10)
            .await?
            .remove(0);
        assert_eq!(occurrence.sequence_index, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_monotonic_cursor_matches_ledger_after_repeated_scans() -> Result<()> {
        let db = setup_test_db().await?;
        let guard = ScanGuard::new();
        let start = utc(2024, 1, 1, 0, 0);
        let template =
            create_test_template(&db, "owner-1", "Rent", Recurrence::Daily, start).await?;

        let mut last_count = 0;
        for day in [2u32, 2, 3, 5, 5] {
            let now = utc(2024, 1, day, 0, 0);
            run_scan(&db, &guard, "owner-1", now).await?;

            let reloaded = require(&db, template.id).await?;
            let ledger =
                crate::store::occurrences::count_for_template(&db, template.id).await?;
            assert_eq!(reloaded.occurrence_count, i64::try_from(ledger).unwrap());
            assert!(reloaded.occurrence_count >= last_count);
            assert!(reloaded.next_due_at > now);
            last_count = reloaded.occurrence_count;
        }

        // Days 2..=5 with a daily schedule: four occurrences in total
        assert_eq!(last_count, 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_format_scan_summary() {
        let report = ScanReport {
            attempted: 3,
            created: 2,
            already_materialized: 0,
            failed: vec![(7, "interval calculation overflowed".to_string())],
            already_running: false,
        };

        let summary = format_scan_summary("owner-1", &report);
        assert!(summary.contains("3 templates"));
        assert!(summary.contains("2 created"));
        assert!(summary.contains("template 7 failed"));

        let skipped = format_scan_summary(
            "owner-1",
            &ScanReport {
                already_running: true,
                ..ScanReport::default()
            },
        );
        assert!(skipped.contains("already running"));
    }
}
