use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use super::domain::{
    CostSettings, Expense, Job, JobId, JobStatus, OperatorPolicy, PaymentEvent, PaymentLog,
    PaymentStatus,
};
use super::noshow::{self, NoShowError, NoShowRequest};
use super::overlap::{find_conflicts, SlotQuery};
use super::payment::{self, PaymentError, PaymentTransition};
use super::profit::{ExpensePolicy, ProfitBreakdown, ProfitEngine, ProfitError};
use super::reference;
use super::repository::{JobRepository, RepositoryError};

/// Facade composing the engine, detector, allocator, and state machines.
/// Every mutation computes the complete new job first and performs one
/// repository write, so a failed write applies nothing.
pub struct JobService<R> {
    repository: Arc<R>,
    engine: ProfitEngine,
    operators: HashMap<String, OperatorPolicy>,
}

static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_job_id() -> JobId {
    let id = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    JobId(format!("job-{id:06}"))
}

/// Fields accepted when logging a new job. Text forms are already parsed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewJob {
    pub booking_date: NaiveDate,
    #[serde(default)]
    pub booking_time: Option<NaiveTime>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub distance_miles: Option<f64>,
    pub fare: f64,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub operator_fee: Option<f64>,
    #[serde(default)]
    pub include_airport_fee: bool,
    #[serde(default)]
    pub airport_fee: Option<f64>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial financial edit; absent fields are left unchanged. Any applied
/// change triggers a profit recomputation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FinancialUpdate {
    #[serde(default)]
    pub fare: Option<f64>,
    #[serde(default)]
    pub distance_miles: Option<f64>,
    #[serde(default)]
    pub operator_fee: Option<f64>,
    #[serde(default)]
    pub include_airport_fee: Option<bool>,
    #[serde(default)]
    pub airport_fee: Option<f64>,
    #[serde(default)]
    pub expenses: Option<Vec<Expense>>,
}

#[derive(Debug, thiserror::Error)]
pub enum JobServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    NoShow(#[from] NoShowError),
    #[error(transparent)]
    Profit(#[from] ProfitError),
    #[error("slot conflicts with existing job(s): {}", .0.join(", "))]
    ScheduleConflict(Vec<String>),
    #[error("only archived jobs can be restored")]
    NotArchived,
}

impl<R> JobService<R>
where
    R: JobRepository + 'static,
{
    pub fn new(
        repository: Arc<R>,
        settings: CostSettings,
        expense_policy: ExpensePolicy,
        operators: Vec<OperatorPolicy>,
    ) -> Self {
        let operators = operators
            .into_iter()
            .map(|policy| (policy.name.clone(), policy))
            .collect();

        Self {
            repository,
            engine: ProfitEngine::new(settings, expense_policy),
            operators,
        }
    }

    pub fn engine(&self) -> &ProfitEngine {
        &self.engine
    }

    fn operator(&self, name: Option<&str>) -> Option<&OperatorPolicy> {
        name.and_then(|name| self.operators.get(name))
    }

    /// Log a new job: guard the slot, allocate the date-sequential
    /// reference, seed the payment trail (auto-scheduling when the
    /// operator carries a cycle), and cache the profit figure.
    pub fn create(&self, new: NewJob, now: DateTime<Utc>) -> Result<Job, JobServiceError> {
        self.guard_slot(new.booking_date, new.booking_time, new.duration_minutes, None)?;

        let prefix = reference::date_prefix(new.booking_date);
        let existing = self.repository.references_with_prefix(&prefix)?;
        let job_ref =
            reference::next_reference(new.booking_date, existing.iter().map(String::as_str));

        let operator = self.operator(new.operator.as_deref()).cloned();

        let mut job = Job {
            id: next_job_id(),
            job_ref: Some(job_ref),
            booking_date: new.booking_date,
            booking_time: new.booking_time,
            duration_minutes: new.duration_minutes,
            distance_miles: new.distance_miles,
            fare: new.fare,
            operator: new.operator,
            operator_fee: new.operator_fee,
            include_airport_fee: new.include_airport_fee,
            airport_fee: new.airport_fee,
            expenses: new.expenses,
            status: JobStatus::Scheduled,
            payment_status: PaymentStatus::Unpaid,
            payment_due_date: None,
            payment_history: PaymentLog::new().appended(PaymentEvent {
                status: PaymentStatus::Unpaid,
                at: now,
                note: None,
            }),
            no_show_at: None,
            no_show_wait_minutes: None,
            original_fare: None,
            cancellation_reason: None,
            cancelled_at: None,
            notes: new.notes,
            profit: None,
            created_at: now,
        };

        if let Some((estimate, event)) =
            payment::schedule_on_creation(job.booking_date, operator.as_ref(), now)
        {
            job.payment_status = PaymentStatus::PaymentScheduled;
            job.payment_due_date = Some(estimate.due);
            job.payment_history = job.payment_history.appended(event);
        }

        job.profit = self.cached_profit(&job, operator.as_ref());

        Ok(self.repository.insert(job)?)
    }

    pub fn get(&self, id: &JobId) -> Result<Job, JobServiceError> {
        Ok(self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?)
    }

    /// Live profitability figures for one job.
    pub fn profit_breakdown(&self, id: &JobId) -> Result<ProfitBreakdown, JobServiceError> {
        let job = self.get(id)?;
        let operator = self.operator(job.operator.as_deref());
        Ok(self.engine.evaluate(&job, operator)?)
    }

    /// Apply a financial edit and recompute the cached profit.
    pub fn update_financials(
        &self,
        id: &JobId,
        update: FinancialUpdate,
    ) -> Result<Job, JobServiceError> {
        let mut job = self.get(id)?;

        if let Some(fare) = update.fare {
            job.fare = fare;
        }
        if let Some(distance) = update.distance_miles {
            job.distance_miles = Some(distance);
        }
        if let Some(rate) = update.operator_fee {
            job.operator_fee = Some(rate);
        }
        if let Some(flag) = update.include_airport_fee {
            job.include_airport_fee = flag;
        }
        if let Some(fee) = update.airport_fee {
            job.airport_fee = Some(fee);
        }
        if let Some(expenses) = update.expenses {
            job.expenses = expenses;
        }

        let operator = self.operator(job.operator.as_deref()).cloned();
        job.profit = self.cached_profit(&job, operator.as_ref());

        self.repository.update(job.clone())?;
        Ok(job)
    }

    /// Move the job to a new slot, re-running the overlap check with the
    /// job itself excluded from the comparison set.
    pub fn reschedule(
        &self,
        id: &JobId,
        booking_date: NaiveDate,
        booking_time: Option<NaiveTime>,
        duration_minutes: Option<u32>,
    ) -> Result<Job, JobServiceError> {
        let mut job = self.get(id)?;

        self.guard_slot(booking_date, booking_time, duration_minutes, Some(id))?;

        job.booking_date = booking_date;
        job.booking_time = booking_time;
        job.duration_minutes = duration_minutes;

        self.repository.update(job.clone())?;
        Ok(job)
    }

    /// Run one payment-status transition; the field update and history
    /// append land in a single write.
    pub fn transition_payment(
        &self,
        id: &JobId,
        transition: PaymentTransition,
        now: DateTime<Utc>,
    ) -> Result<Job, JobServiceError> {
        let mut job = self.get(id)?;

        let update = payment::apply_transition(&job, transition, now)?;
        job.payment_status = update.status;
        job.payment_due_date = update.due_date;
        job.payment_history = update.history;

        self.repository.update(job.clone())?;
        Ok(job)
    }

    /// `now` keeps its UTC offset so the grace window is measured on the
    /// wall clock the booking was written in.
    pub fn mark_no_show(
        &self,
        id: &JobId,
        request: NoShowRequest,
        now: DateTime<FixedOffset>,
    ) -> Result<Job, JobServiceError> {
        let job = self.get(id)?;
        let operator = self.operator(job.operator.as_deref());

        let updated = noshow::mark(&job, request, &self.engine, operator, now)?;
        self.repository.update(updated.clone())?;
        Ok(updated)
    }

    pub fn revert_no_show(&self, id: &JobId) -> Result<Job, JobServiceError> {
        let job = self.get(id)?;
        let operator = self.operator(job.operator.as_deref());

        let updated = noshow::revert(&job, &self.engine, operator)?;
        self.repository.update(updated.clone())?;
        Ok(updated)
    }

    pub fn archive(&self, id: &JobId) -> Result<Job, JobServiceError> {
        let mut job = self.get(id)?;
        job.status = JobStatus::Archived;
        self.repository.update(job.clone())?;
        Ok(job)
    }

    /// Archived jobs can only come back as scheduled. The slot may have
    /// been taken while the job sat archived, so the overlap guard runs
    /// again before the status flips.
    pub fn restore(&self, id: &JobId) -> Result<Job, JobServiceError> {
        let mut job = self.get(id)?;
        if job.status != JobStatus::Archived {
            return Err(JobServiceError::NotArchived);
        }
        self.guard_slot(job.booking_date, job.booking_time, job.duration_minutes, Some(id))?;
        job.status = JobStatus::Scheduled;
        self.repository.update(job.clone())?;
        Ok(job)
    }

    pub fn delete(&self, id: &JobId) -> Result<(), JobServiceError> {
        Ok(self.repository.remove(id)?)
    }

    /// Insert historical rows without references, then assign references
    /// in one date-grouped backfill pass.
    pub fn import_history(
        &self,
        rows: Vec<NewJob>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Job>, JobServiceError> {
        let mut imported = Vec::with_capacity(rows.len());

        for row in rows {
            let operator = self.operator(row.operator.as_deref()).cloned();
            let mut job = Job {
                id: next_job_id(),
                job_ref: None,
                booking_date: row.booking_date,
                booking_time: row.booking_time,
                duration_minutes: row.duration_minutes,
                distance_miles: row.distance_miles,
                fare: row.fare,
                operator: row.operator,
                operator_fee: row.operator_fee,
                include_airport_fee: row.include_airport_fee,
                airport_fee: row.airport_fee,
                expenses: row.expenses,
                status: JobStatus::Completed,
                payment_status: PaymentStatus::Unpaid,
                payment_due_date: None,
                payment_history: PaymentLog::new().appended(PaymentEvent {
                    status: PaymentStatus::Unpaid,
                    at: now,
                    note: Some("imported from history".to_string()),
                }),
                no_show_at: None,
                no_show_wait_minutes: None,
                original_fare: None,
                cancellation_reason: None,
                cancelled_at: None,
                notes: row.notes,
                profit: None,
                created_at: now,
            };
            job.profit = self.cached_profit(&job, operator.as_ref());
            imported.push(self.repository.insert(job)?);
        }

        self.backfill_references()?;

        for job in &mut imported {
            if let Some(stored) = self.repository.fetch(&job.id)? {
                *job = stored;
            }
        }

        Ok(imported)
    }

    /// Assign references to every stored job that lacks one.
    pub fn backfill_references(&self) -> Result<usize, JobServiceError> {
        let pending = self.repository.missing_references()?;
        if pending.is_empty() {
            return Ok(0);
        }

        let existing = self.repository.references_with_prefix(reference::JOB_REF_TAG)?;
        let keys: Vec<(JobId, NaiveDate)> = pending
            .iter()
            .map(|job| (job.id.clone(), job.booking_date))
            .collect();

        let assignments = reference::backfill(&keys, existing.iter().map(String::as_str));
        let assigned = assignments.len();

        for assignment in assignments {
            if let Some(mut job) = self.repository.fetch(&assignment.id)? {
                job.job_ref = Some(assignment.job_ref);
                self.repository.update(job)?;
            }
        }

        Ok(assigned)
    }

    fn guard_slot(
        &self,
        booking_date: NaiveDate,
        booking_time: Option<NaiveTime>,
        duration_minutes: Option<u32>,
        exclude: Option<&JobId>,
    ) -> Result<(), JobServiceError> {
        let (time, duration) = match (booking_time, duration_minutes) {
            (Some(time), Some(duration)) => (time, duration),
            // Without a parsable window the slot cannot conflict.
            _ => return Ok(()),
        };

        let others = self.repository.scheduled_on(booking_date, exclude)?;
        let query = SlotQuery {
            booking_date,
            booking_time: time,
            duration_minutes: duration,
            exclude: exclude.cloned(),
        };

        let conflicts = find_conflicts(&query, others.iter());
        if conflicts.is_empty() {
            return Ok(());
        }

        let labels = conflicts
            .iter()
            .map(|job| job.job_ref.clone().unwrap_or_else(|| job.id.0.clone()))
            .collect();
        Err(JobServiceError::ScheduleConflict(labels))
    }

    fn cached_profit(&self, job: &Job, operator: Option<&OperatorPolicy>) -> Option<f64> {
        self.engine
            .evaluate(job, operator)
            .ok()
            .map(|breakdown| breakdown.total_profit)
    }
}
