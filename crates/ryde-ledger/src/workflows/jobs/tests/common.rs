use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::jobs::domain::{
    CostSettings, Expense, Job, JobId, JobStatus, OperatorPolicy, PaymentEvent, PaymentLog,
    PaymentStatus, RefundStatus,
};
use crate::workflows::jobs::profit::{ExpensePolicy, ProfitEngine};
use crate::workflows::jobs::repository::{JobRepository, RepositoryError};
use crate::workflows::jobs::service::JobService;

pub(super) fn settings() -> CostSettings {
    CostSettings {
        fuel_price_per_litre: 1.50,
        fuel_efficiency_mpg: 45.0,
        maintenance_cost_per_mile: 0.15,
        default_commission_rate: 10.0,
        default_airport_fee: 5.0,
        target_profit_per_mile: 2.0,
    }
}

pub(super) fn engine() -> ProfitEngine {
    ProfitEngine::new(settings(), ExpensePolicy::DeductAll)
}

pub(super) fn operators() -> Vec<OperatorPolicy> {
    vec![
        OperatorPolicy {
            name: "CityCars".to_string(),
            charges_commission: true,
            commission_rate: 12.5,
            payment_cycle: Some("weekly".to_string()),
        },
        OperatorPolicy {
            name: "AirLink".to_string(),
            charges_commission: true,
            commission_rate: 15.0,
            payment_cycle: Some("monthly invoicing".to_string()),
        },
        OperatorPolicy {
            name: "DirectClient".to_string(),
            charges_commission: false,
            commission_rate: 0.0,
            payment_cycle: None,
        },
    ]
}

pub(super) fn booking_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 5).expect("valid date")
}

pub(super) fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

/// An instant on the booking date, expressed in UTC.
pub(super) fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 5, hour, minute, 0)
        .single()
        .expect("valid instant")
}

/// The same instant carrying a zero offset, for the no-show clock.
pub(super) fn clock(hour: u32, minute: u32) -> DateTime<FixedOffset> {
    at(hour, minute).fixed_offset()
}

pub(super) fn base_job(id: &str) -> Job {
    Job {
        id: JobId(id.to_string()),
        job_ref: Some("RYDE05012025-1".to_string()),
        booking_date: booking_date(),
        booking_time: Some(time(9, 0)),
        duration_minutes: Some(30),
        distance_miles: Some(6.9),
        fare: 60.0,
        operator: None,
        operator_fee: None,
        include_airport_fee: false,
        airport_fee: None,
        expenses: Vec::new(),
        status: JobStatus::Scheduled,
        payment_status: PaymentStatus::Unpaid,
        payment_due_date: None,
        payment_history: PaymentLog::new().appended(PaymentEvent {
            status: PaymentStatus::Unpaid,
            at: at(8, 0),
            note: None,
        }),
        no_show_at: None,
        no_show_wait_minutes: None,
        original_fare: None,
        cancellation_reason: None,
        cancelled_at: None,
        notes: None,
        profit: None,
        created_at: at(8, 0),
    }
}

pub(super) fn expense(kind: &str, amount: f64, refund: RefundStatus) -> Expense {
    Expense {
        kind: kind.to_string(),
        amount,
        paid_by_driver: true,
        refund,
    }
}

pub(super) fn build_service() -> (Arc<JobService<MemoryRepository>>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = Arc::new(JobService::new(
        repository.clone(),
        settings(),
        ExpensePolicy::DeductAll,
        operators(),
    ));
    (service, repository)
}

/// Insertion-ordered in-memory store so backfill order is observable.
#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<Vec<Job>>>,
}

impl JobRepository for MemoryRepository {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|stored| stored.id == job.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(job.clone());
        Ok(job)
    }

    fn update(&self, job: Job) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.iter_mut().find(|stored| stored.id == job.id) {
            Some(stored) => {
                *stored = job;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|stored| &stored.id == id).cloned())
    }

    fn remove(&self, id: &JobId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let before = guard.len();
        guard.retain(|stored| &stored.id != id);
        if guard.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn scheduled_on(
        &self,
        date: NaiveDate,
        exclude: Option<&JobId>,
    ) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|job| job.booking_date == date)
            .filter(|job| job.status.blocks_schedule())
            .filter(|job| Some(&job.id) != exclude)
            .cloned()
            .collect())
    }

    fn references_with_prefix(&self, prefix: &str) -> Result<Vec<String>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter_map(|job| job.job_ref.clone())
            .filter(|reference| reference.starts_with(prefix))
            .collect())
    }

    fn missing_references(&self) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|job| job.job_ref.is_none())
            .cloned()
            .collect())
    }
}

/// Repository double that refuses every write.
pub(super) struct UnavailableRepository;

impl JobRepository for UnavailableRepository {
    fn insert(&self, _job: Job) -> Result<Job, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _job: Job) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: &JobId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn scheduled_on(
        &self,
        _date: NaiveDate,
        _exclude: Option<&JobId>,
    ) -> Result<Vec<Job>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn references_with_prefix(&self, _prefix: &str) -> Result<Vec<String>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn missing_references(&self) -> Result<Vec<Job>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
