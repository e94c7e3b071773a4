use chrono::NaiveDate;

use super::domain::{Job, JobId};

/// Storage abstraction so the service can be exercised in isolation; real
/// persistence, locking, and conditional writes live behind it.
pub trait JobRepository: Send + Sync {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError>;
    fn update(&self, job: Job) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn remove(&self, id: &JobId) -> Result<(), RepositoryError>;
    /// Active jobs booked on `date`, optionally excluding one id; feeds
    /// the overlap detector.
    fn scheduled_on(
        &self,
        date: NaiveDate,
        exclude: Option<&JobId>,
    ) -> Result<Vec<Job>, RepositoryError>;
    /// Every allocated reference starting with `prefix`; feeds the
    /// reference allocator. Scans all stored jobs, archived included.
    fn references_with_prefix(&self, prefix: &str) -> Result<Vec<String>, RepositoryError>;
    /// Jobs without a reference yet, in creation order; feeds backfill.
    fn missing_references(&self) -> Result<Vec<Job>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
