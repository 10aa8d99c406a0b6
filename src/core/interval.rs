//! Interval calculation - the pure schedule arithmetic of the engine.
//!
//! A recurrence descriptor plus an anchor instant define an infinite
//! schedule; [`occurrence_instant`] returns the instant of the n-th cycle.
//! Due instants are always computed as `anchor + n x interval`, never by
//! iterating `previous + interval`: calendar clamping (Jan 31 + 1 month =
//! Feb 28) then applies per computation and never compounds, so a schedule
//! anchored on the 31st returns to the 31st in longer months.
//!
//! No side effects, no I/O, fully deterministic - this determinism is what
//! makes the materializer's idempotency check trustworthy.

use crate::entities::recurring_template;
use crate::errors::{Error, Result};
use chrono::{DateTime, Days, Months, TimeDelta, Utc};

/// Unit of a custom recurrence interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    /// Literal minutes
    Minutes,
    /// Literal hours
    Hours,
    /// Calendar days (wall-clock time preserved)
    Days,
    /// Calendar weeks
    Weeks,
    /// Calendar months, clamped to the last valid day of the target month
    Months,
    /// Calendar years, Feb 29 clamped to Feb 28 in non-leap years
    Years,
}

impl IntervalUnit {
    /// Parses the unit from its stored column form.
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "minutes" => Some(Self::Minutes),
            "hours" => Some(Self::Hours),
            "days" => Some(Self::Days),
            "weeks" => Some(Self::Weeks),
            "months" => Some(Self::Months),
            "years" => Some(Self::Years),
            _ => None,
        }
    }

    /// The stored column form of the unit.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
            Self::Years => "years",
        }
    }
}

/// A validated recurrence descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    /// Every calendar day, same wall-clock time
    Daily,
    /// Every 7 calendar days
    Weekly,
    /// Every calendar month, end-of-month clamped
    Monthly,
    /// Every calendar year, Feb 29 clamped
    Yearly,
    /// Every `amount` units of `unit`
    Custom {
        /// Positive interval multiplier
        amount: u32,
        /// Interval unit
        unit: IntervalUnit,
    },
}

impl Recurrence {
    /// Builds a validated custom descriptor.
    pub fn custom(amount: i64, unit: IntervalUnit) -> Result<Self> {
        let amount = u32::try_from(amount)
            .ok()
            .filter(|&a| a > 0)
            .ok_or_else(|| Error::InvalidDescriptor {
                message: format!("custom interval amount must be positive, got {amount}"),
            })?;
        Ok(Self::Custom { amount, unit })
    }

    /// Reconstructs the descriptor from its stored column form.
    ///
    /// Used when a template is read back from the store; a malformed row
    /// (e.g. `"custom"` frequency with no unit) yields `InvalidDescriptor`.
    pub fn from_columns(
        frequency: &str,
        interval_amount: Option<i32>,
        interval_unit: Option<&str>,
    ) -> Result<Self> {
        match frequency {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "custom" => {
                let amount = interval_amount.ok_or_else(|| Error::InvalidDescriptor {
                    message: "custom frequency is missing its interval amount".to_string(),
                })?;
                let unit = interval_unit
                    .and_then(IntervalUnit::parse)
                    .ok_or_else(|| Error::InvalidDescriptor {
                        message: format!(
                            "custom frequency has an unrecognized interval unit {interval_unit:?}"
                        ),
                    })?;
                Self::custom(i64::from(amount), unit)
            }
            other => Err(Error::InvalidDescriptor {
                message: format!("unrecognized frequency {other:?}"),
            }),
        }
    }

    /// Reconstructs the descriptor stored on a template row.
    pub fn from_template(template: &recurring_template::Model) -> Result<Self> {
        Self::from_columns(
            &template.frequency,
            template.interval_amount,
            template.interval_unit.as_deref(),
        )
    }

    /// Decomposes the descriptor into its stored column form:
    /// `(frequency, interval_amount, interval_unit)`.
    pub fn to_columns(self) -> (String, Option<i32>, Option<String>) {
        match self {
            Self::Daily => ("daily".to_string(), None, None),
            Self::Weekly => ("weekly".to_string(), None, None),
            Self::Monthly => ("monthly".to_string(), None, None),
            Self::Yearly => ("yearly".to_string(), None, None),
            Self::Custom { amount, unit } => (
                "custom".to_string(),
                // amount is validated to fit well inside i32 range
                i32::try_from(amount).ok(),
                Some(unit.as_str().to_string()),
            ),
        }
    }
}

/// Returns the instant at which the `count`-th occurrence (1-based) of a
/// schedule falls, given its anchor instant and descriptor.
///
/// `Err(CalculationOverflow)` when the arithmetic would leave the
/// representable date range, or when `count` is not positive.
pub fn occurrence_instant(
    anchor: DateTime<Utc>,
    descriptor: Recurrence,
    count: i64,
) -> Result<DateTime<Utc>> {
    if count <= 0 {
        return Err(Error::CalculationOverflow);
    }

    let result = match descriptor {
        Recurrence::Daily => add_days(anchor, Some(count)),
        Recurrence::Weekly => add_days(anchor, count.checked_mul(7)),
        Recurrence::Monthly => add_months(anchor, Some(count)),
        Recurrence::Yearly => add_months(anchor, count.checked_mul(12)),
        Recurrence::Custom { amount, unit } => {
            let total = count.checked_mul(i64::from(amount));
            match unit {
                IntervalUnit::Minutes => add_minutes(anchor, total),
                IntervalUnit::Hours => add_minutes(anchor, total.and_then(|t| t.checked_mul(60))),
                IntervalUnit::Days => add_days(anchor, total),
                IntervalUnit::Weeks => add_days(anchor, total.and_then(|t| t.checked_mul(7))),
                IntervalUnit::Months => add_months(anchor, total),
                IntervalUnit::Years => add_months(anchor, total.and_then(|t| t.checked_mul(12))),
            }
        }
    };

    result.ok_or(Error::CalculationOverflow)
}

fn add_minutes(anchor: DateTime<Utc>, minutes: Option<i64>) -> Option<DateTime<Utc>> {
    anchor.checked_add_signed(TimeDelta::try_minutes(minutes?)?)
}

fn add_days(anchor: DateTime<Utc>, days: Option<i64>) -> Option<DateTime<Utc>> {
    anchor.checked_add_days(Days::new(u64::try_from(days?).ok()?))
}

fn add_months(anchor: DateTime<Utc>, months: Option<i64>) -> Option<DateTime<Utc>> {
    anchor.checked_add_months(Months::new(u32::try_from(months?).ok()?))
}
