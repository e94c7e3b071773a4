use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Job, OperatorPolicy, PaymentEvent, PaymentLog, PaymentStatus};

/// Requested payment-status change. Any state may move to any other; the
/// pairing of side effects is what the machine enforces.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentTransition {
    pub to: PaymentStatus,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub note: Option<String>,
}

/// The full outcome of a transition, written by the caller as one unit so
/// a failed persistence write leaves neither field nor history applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentUpdate {
    pub status: PaymentStatus,
    pub due_date: Option<NaiveDate>,
    pub history: PaymentLog,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("entering payment-scheduled requires a due date")]
    MissingDueDate,
}

/// Validate and apply a transition against the job's current state.
pub fn apply_transition(
    job: &Job,
    transition: PaymentTransition,
    now: DateTime<Utc>,
) -> Result<PaymentUpdate, PaymentError> {
    let due_date = match transition.to {
        PaymentStatus::PaymentScheduled => {
            Some(transition.due_date.ok_or(PaymentError::MissingDueDate)?)
        }
        // Every other status clears the due date.
        _ => None,
    };

    let history = job.payment_history.appended(PaymentEvent {
        status: transition.to,
        at: now,
        note: transition.note,
    });

    Ok(PaymentUpdate {
        status: transition.to,
        due_date,
        history,
    })
}

/// Due date derived from an operator's free-text payment cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DueDateEstimate {
    pub due: NaiveDate,
    /// Set when the cycle text was unrecognized and the weekly default
    /// stood in; a best-effort estimate, not a guarantee.
    pub assumed_default: bool,
}

/// "weekly" => +7 days, "monthly" => +30 days (fixed-length, not
/// calendar-month aware), other non-empty text => +7 days flagged as
/// assumed, empty/absent => no due date.
pub fn due_date_for_cycle(booking_date: NaiveDate, cycle: &str) -> Option<DueDateEstimate> {
    let normalized = cycle.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return None;
    }

    if normalized.contains("weekly") {
        Some(DueDateEstimate {
            due: booking_date + Duration::days(7),
            assumed_default: false,
        })
    } else if normalized.contains("monthly") {
        Some(DueDateEstimate {
            due: booking_date + Duration::days(30),
            assumed_default: false,
        })
    } else {
        Some(DueDateEstimate {
            due: booking_date + Duration::days(7),
            assumed_default: true,
        })
    }
}

/// Automatic scheduling at creation time: an unpaid job booked with an
/// operator that has a configured cycle advances straight to
/// payment-scheduled, with a history note explaining why.
pub fn schedule_on_creation(
    booking_date: NaiveDate,
    operator: Option<&OperatorPolicy>,
    now: DateTime<Utc>,
) -> Option<(DueDateEstimate, PaymentEvent)> {
    let cycle = operator.and_then(|policy| policy.payment_cycle.as_deref())?;
    let estimate = due_date_for_cycle(booking_date, cycle)?;

    let note = if estimate.assumed_default {
        format!("payment scheduled automatically; unrecognized cycle '{cycle}' assumed weekly")
    } else {
        format!("payment scheduled automatically from operator cycle '{cycle}'")
    };

    Some((
        estimate,
        PaymentEvent {
            status: PaymentStatus::PaymentScheduled,
            at: now,
            note: Some(note),
        },
    ))
}
