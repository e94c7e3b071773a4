use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use serde::Deserialize;

use super::domain::{Expense, Job, JobStatus, OperatorPolicy};
use super::profit::ProfitEngine;

/// Minutes past the booked start before a no-show may be recorded.
pub const NO_SHOW_GRACE_MINUTES: i64 = 15;

/// How the fare is adjusted when the customer fails to appear.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule", content = "amount")]
pub enum NoShowPaymentRule {
    Full,
    Half,
    Custom(f64),
}

/// Caller-supplied evidence and adjustments for marking a no-show.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NoShowRequest {
    pub wait_minutes: u32,
    #[serde(default)]
    pub evidence: Option<String>,
    pub payment: NoShowPaymentRule,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NoShowError {
    #[error("job is already marked as a no-show")]
    AlreadyMarked,
    #[error("job status '{0}' is not eligible for a no-show")]
    NotEligible(&'static str),
    #[error("job has no booking date and time to measure the wait against")]
    MissingSchedule,
    #[error("grace period has not elapsed; available from {available_from}")]
    GracePeriodActive { available_from: NaiveDateTime },
    #[error("no captured original fare; nothing to revert")]
    NothingToRevert,
}

/// Check whether a no-show can be recorded right now. Offered only for
/// scheduled jobs (or plain cancellations not yet marked), after the
/// booked start plus the grace period.
///
/// `now` carries the driver's UTC offset: booking times are wall-clock
/// values, so the grace window is measured on the same local clock.
pub fn eligibility(job: &Job, now: DateTime<FixedOffset>) -> Result<(), NoShowError> {
    if job.is_no_show() {
        return Err(NoShowError::AlreadyMarked);
    }

    match job.status {
        JobStatus::Scheduled | JobStatus::Cancelled => {}
        other => return Err(NoShowError::NotEligible(other.label())),
    }

    let start = job.start_at().ok_or(NoShowError::MissingSchedule)?;
    let available_from = start + Duration::minutes(NO_SHOW_GRACE_MINUTES);
    if now.naive_local() < available_from {
        return Err(NoShowError::GracePeriodActive { available_from });
    }

    Ok(())
}

/// Apply the compound no-show transition, returning the fully updated job
/// for a single atomic write.
pub fn mark(
    job: &Job,
    request: NoShowRequest,
    engine: &ProfitEngine,
    operator: Option<&OperatorPolicy>,
    now: DateTime<FixedOffset>,
) -> Result<Job, NoShowError> {
    eligibility(job, now)?;

    let mut updated = job.clone();

    // Capture once; repeated edits must not overwrite the pre-adjustment
    // fare with an already-adjusted one.
    if updated.original_fare.is_none() {
        updated.original_fare = Some(updated.fare);
    }

    updated.fare = match request.payment {
        NoShowPaymentRule::Full => updated.fare,
        NoShowPaymentRule::Half => updated.fare / 2.0,
        NoShowPaymentRule::Custom(amount) => amount,
    };

    let instant = now.with_timezone(&Utc);
    updated.status = JobStatus::Cancelled;
    updated.cancellation_reason = Some("customer no-show".to_string());
    updated.cancelled_at = Some(instant);
    updated.no_show_at = Some(instant);
    updated.no_show_wait_minutes = Some(request.wait_minutes);
    updated.expenses = request.expenses;

    if let Some(evidence) = request.evidence.filter(|text| !text.trim().is_empty()) {
        updated.notes = Some(match updated.notes.take() {
            Some(existing) => format!("{existing}\n[no-show] {evidence}"),
            None => format!("[no-show] {evidence}"),
        });
    }

    updated.profit = engine
        .evaluate(&updated, operator)
        .ok()
        .map(|breakdown| breakdown.total_profit);

    Ok(updated)
}

/// Undo a recorded no-show: restore the captured fare, drop the no-show
/// evidence fields and expenses, and leave a plain cancellation behind.
pub fn revert(
    job: &Job,
    engine: &ProfitEngine,
    operator: Option<&OperatorPolicy>,
) -> Result<Job, NoShowError> {
    let original_fare = job.original_fare.ok_or(NoShowError::NothingToRevert)?;

    let mut updated = job.clone();
    updated.fare = original_fare;
    updated.original_fare = None;
    updated.no_show_at = None;
    updated.no_show_wait_minutes = None;
    updated.expenses = Vec::new();
    updated.status = JobStatus::Cancelled;
    updated.cancellation_reason = None;

    updated.profit = engine
        .evaluate(&updated, operator)
        .ok()
        .map(|breakdown| breakdown.total_profit);

    Ok(updated)
}
