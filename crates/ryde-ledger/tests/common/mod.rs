use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use ryde_ledger::workflows::jobs::{
    CostSettings, ExpensePolicy, Job, JobId, JobRepository, JobService, OperatorPolicy,
    RepositoryError,
};

pub fn settings() -> CostSettings {
    CostSettings {
        fuel_price_per_litre: 1.50,
        fuel_efficiency_mpg: 45.0,
        maintenance_cost_per_mile: 0.15,
        default_commission_rate: 10.0,
        default_airport_fee: 5.0,
        target_profit_per_mile: 2.0,
    }
}

pub fn operators() -> Vec<OperatorPolicy> {
    vec![
        OperatorPolicy {
            name: "CityCars".to_string(),
            charges_commission: true,
            commission_rate: 12.5,
            payment_cycle: Some("weekly".to_string()),
        },
        OperatorPolicy {
            name: "DirectClient".to_string(),
            charges_commission: false,
            commission_rate: 0.0,
            payment_cycle: None,
        },
    ]
}

pub fn build_service() -> (Arc<JobService<MemoryStore>>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let service = Arc::new(JobService::new(
        store.clone(),
        settings(),
        ExpensePolicy::DeductAll,
        operators(),
    ));
    (service, store)
}

/// Minimal insertion-ordered store standing in for real persistence.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Job>>,
}

impl JobRepository for MemoryStore {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.iter().any(|stored| stored.id == job.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(job.clone());
        Ok(job)
    }

    fn update(&self, job: Job) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        match guard.iter_mut().find(|stored| stored.id == job.id) {
            Some(stored) => {
                *stored = job;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.iter().find(|stored| &stored.id == id).cloned())
    }

    fn remove(&self, id: &JobId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
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
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|job| job.booking_date == date)
            .filter(|job| job.status.blocks_schedule())
            .filter(|job| Some(&job.id) != exclude)
            .cloned()
            .collect())
    }

    fn references_with_prefix(&self, prefix: &str) -> Result<Vec<String>, RepositoryError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .iter()
            .filter_map(|job| job.job_ref.clone())
            .filter(|reference| reference.starts_with(prefix))
            .collect())
    }

    fn missing_references(&self) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|job| job.job_ref.is_none())
            .cloned()
            .collect())
    }
}
