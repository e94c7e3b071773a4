//! CSV import for historical jobs logged before this system existed.
//!
//! Rows arrive with free-text durations, distances, and inconsistently
//! populated price columns; the parser and normalizer turn them into
//! canonical [`NewJob`] values, and the service assigns references in a
//! date-grouped backfill pass after insertion.

mod normalizer;
mod parser;

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::workflows::jobs::{Job, JobRepository, JobService, JobServiceError, NewJob};

#[derive(Debug)]
pub enum HistoryImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Service(JobServiceError),
}

impl std::fmt::Display for HistoryImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryImportError::Io(err) => write!(f, "failed to read history export: {}", err),
            HistoryImportError::Csv(err) => write!(f, "invalid history CSV data: {}", err),
            HistoryImportError::Service(err) => {
                write!(f, "could not store imported jobs: {}", err)
            }
        }
    }
}

impl std::error::Error for HistoryImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HistoryImportError::Io(err) => Some(err),
            HistoryImportError::Csv(err) => Some(err),
            HistoryImportError::Service(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for HistoryImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for HistoryImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<JobServiceError> for HistoryImportError {
    fn from(err: JobServiceError) -> Self {
        Self::Service(err)
    }
}

pub struct JobHistoryImporter;

impl JobHistoryImporter {
    /// Parse a CSV export into canonical rows without touching storage.
    /// Rows missing a usable booking date are dropped.
    pub fn rows_from_reader<R: Read>(reader: R) -> Result<Vec<NewJob>, HistoryImportError> {
        let rows = parser::parse_rows(reader)?;
        Ok(rows.into_iter().filter_map(normalizer::normalize_row).collect())
    }

    pub fn import_from_path<P, R>(
        path: P,
        service: &JobService<R>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Job>, HistoryImportError>
    where
        P: AsRef<Path>,
        R: JobRepository + 'static,
    {
        let file = std::fs::File::open(path)?;
        Self::import_from_reader(file, service, now)
    }

    pub fn import_from_reader<I, R>(
        reader: I,
        service: &JobService<R>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Job>, HistoryImportError>
    where
        I: Read,
        R: JobRepository + 'static,
    {
        let rows = Self::rows_from_reader(reader)?;
        Ok(service.import_history(rows, now)?)
    }
}
