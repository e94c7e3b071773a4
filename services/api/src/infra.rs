use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use ryde_ledger::workflows::jobs::{
    Job, JobId, JobRepository, OperatorPolicy, RepositoryError,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryJobRepository {
    records: Arc<Mutex<HashMap<JobId, Job>>>,
}

impl JobRepository for InMemoryJobRepository {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn update(&self, job: Job) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&job.id) {
            guard.insert(job.id.clone(), job);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &JobId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.remove(id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn scheduled_on(
        &self,
        date: NaiveDate,
        exclude: Option<&JobId>,
    ) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|job| job.booking_date == date)
            .filter(|job| job.status.blocks_schedule())
            .filter(|job| Some(&job.id) != exclude)
            .cloned()
            .collect())
    }

    fn references_with_prefix(&self, prefix: &str) -> Result<Vec<String>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter_map(|job| job.job_ref.clone())
            .filter(|reference| reference.starts_with(prefix))
            .collect())
    }

    fn missing_references(&self) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut pending: Vec<Job> = guard
            .values()
            .filter(|job| job.job_ref.is_none())
            .cloned()
            .collect();
        // HashMap iteration order is arbitrary; keep backfill deterministic.
        pending.sort_by(|a, b| {
            (a.booking_date, a.created_at, &a.id.0).cmp(&(b.booking_date, b.created_at, &b.id.0))
        });
        Ok(pending)
    }
}

/// Operator policies the service boots with until a config store exists.
pub(crate) fn default_operators() -> Vec<OperatorPolicy> {
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

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
