use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{Expense, Job, JobId};
use super::noshow::NoShowRequest;
use super::parse::{parse_distance_miles, parse_duration_minutes};
use super::payment::PaymentTransition;
use super::repository::{JobRepository, RepositoryError};
use super::service::{FinancialUpdate, JobService, JobServiceError, NewJob};

/// Router builder exposing the job ledger over HTTP.
pub fn job_router<R>(service: Arc<JobService<R>>) -> Router
where
    R: JobRepository + 'static,
{
    Router::new()
        .route("/api/v1/jobs", post(create_handler::<R>))
        .route(
            "/api/v1/jobs/:job_id",
            get(fetch_handler::<R>).delete(delete_handler::<R>),
        )
        .route("/api/v1/jobs/:job_id/profit", get(profit_handler::<R>))
        .route(
            "/api/v1/jobs/:job_id/financials",
            post(financials_handler::<R>),
        )
        .route(
            "/api/v1/jobs/:job_id/schedule",
            post(reschedule_handler::<R>),
        )
        .route("/api/v1/jobs/:job_id/payment", post(payment_handler::<R>))
        .route("/api/v1/jobs/:job_id/no-show", post(no_show_handler::<R>))
        .route(
            "/api/v1/jobs/:job_id/no-show/revert",
            post(revert_handler::<R>),
        )
        .route("/api/v1/jobs/:job_id/archive", post(archive_handler::<R>))
        .route("/api/v1/jobs/:job_id/restore", post(restore_handler::<R>))
        .with_state(service)
}

/// Job creation payload; distance and duration arrive in their free-text
/// forms and are parsed here, at the boundary.
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub booking_date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub booking_time: Option<NaiveTime>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub distance: Option<String>,
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

impl CreateJobRequest {
    fn into_new_job(self) -> NewJob {
        NewJob {
            booking_date: self.booking_date,
            booking_time: self.booking_time,
            duration_minutes: self.duration.as_deref().and_then(parse_duration_minutes),
            distance_miles: self.distance.as_deref().and_then(parse_distance_miles),
            fare: self.fare,
            operator: self.operator,
            operator_fee: self.operator_fee,
            include_airport_fee: self.include_airport_fee,
            airport_fee: self.airport_fee,
            expenses: self.expenses,
            notes: self.notes,
        }
    }
}

/// Sanitized job representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_ref: Option<String>,
    pub booking_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_time: Option<NaiveTime>,
    pub status: &'static str,
    pub payment_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_due_date: Option<NaiveDate>,
    pub fare: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit: Option<f64>,
    pub payment_history_len: usize,
    pub no_show: bool,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.0.clone(),
            job_ref: job.job_ref.clone(),
            booking_date: job.booking_date,
            booking_time: job.booking_time,
            status: job.status.label(),
            payment_status: job.payment_status.label(),
            payment_due_date: job.payment_due_date,
            fare: job.fare,
            profit: job.profit,
            payment_history_len: job.payment_history.len(),
            no_show: job.is_no_show(),
        }
    }
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<JobService<R>>>,
    axum::Json(request): axum::Json<CreateJobRequest>,
) -> Response
where
    R: JobRepository + 'static,
{
    match service.create(request.into_new_job(), Utc::now()) {
        Ok(job) => (StatusCode::CREATED, axum::Json(JobView::from(&job))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn fetch_handler<R>(
    State(service): State<Arc<JobService<R>>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
{
    match service.get(&JobId(job_id)) {
        Ok(job) => (StatusCode::OK, axum::Json(JobView::from(&job))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn profit_handler<R>(
    State(service): State<Arc<JobService<R>>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
{
    match service.profit_breakdown(&JobId(job_id)) {
        Ok(breakdown) => (StatusCode::OK, axum::Json(breakdown)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Slot change payload; duration arrives as free text like the create
/// request.
#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub booking_date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub booking_time: Option<NaiveTime>,
    #[serde(default)]
    pub duration: Option<String>,
}

pub(crate) async fn financials_handler<R>(
    State(service): State<Arc<JobService<R>>>,
    Path(job_id): Path<String>,
    axum::Json(update): axum::Json<FinancialUpdate>,
) -> Response
where
    R: JobRepository + 'static,
{
    match service.update_financials(&JobId(job_id), update) {
        Ok(job) => (StatusCode::OK, axum::Json(JobView::from(&job))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reschedule_handler<R>(
    State(service): State<Arc<JobService<R>>>,
    Path(job_id): Path<String>,
    axum::Json(request): axum::Json<RescheduleRequest>,
) -> Response
where
    R: JobRepository + 'static,
{
    let duration = request.duration.as_deref().and_then(parse_duration_minutes);
    match service.reschedule(
        &JobId(job_id),
        request.booking_date,
        request.booking_time,
        duration,
    ) {
        Ok(job) => (StatusCode::OK, axum::Json(JobView::from(&job))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn archive_handler<R>(
    State(service): State<Arc<JobService<R>>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
{
    match service.archive(&JobId(job_id)) {
        Ok(job) => (StatusCode::OK, axum::Json(JobView::from(&job))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn restore_handler<R>(
    State(service): State<Arc<JobService<R>>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
{
    match service.restore(&JobId(job_id)) {
        Ok(job) => (StatusCode::OK, axum::Json(JobView::from(&job))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<JobService<R>>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
{
    match service.delete(&JobId(job_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn payment_handler<R>(
    State(service): State<Arc<JobService<R>>>,
    Path(job_id): Path<String>,
    axum::Json(transition): axum::Json<PaymentTransition>,
) -> Response
where
    R: JobRepository + 'static,
{
    match service.transition_payment(&JobId(job_id), transition, Utc::now()) {
        Ok(job) => (StatusCode::OK, axum::Json(JobView::from(&job))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn no_show_handler<R>(
    State(service): State<Arc<JobService<R>>>,
    Path(job_id): Path<String>,
    axum::Json(request): axum::Json<NoShowRequest>,
) -> Response
where
    R: JobRepository + 'static,
{
    match service.mark_no_show(&JobId(job_id), request, Local::now().fixed_offset()) {
        Ok(job) => (StatusCode::OK, axum::Json(JobView::from(&job))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn revert_handler<R>(
    State(service): State<Arc<JobService<R>>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
{
    match service.revert_no_show(&JobId(job_id)) {
        Ok(job) => (StatusCode::OK, axum::Json(JobView::from(&job))).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: JobServiceError) -> Response {
    let status = match &error {
        JobServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        JobServiceError::Repository(RepositoryError::Conflict)
        | JobServiceError::ScheduleConflict(_) => StatusCode::CONFLICT,
        JobServiceError::Payment(_)
        | JobServiceError::NoShow(_)
        | JobServiceError::Profit(_)
        | JobServiceError::NotArchived => StatusCode::UNPROCESSABLE_ENTITY,
        JobServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn deserialize_optional_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|raw| parse_time(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

/// Accept "HH:MM" or "HH:MM:SS" clock text.
pub fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|err| format!("failed to parse '{raw}' as HH:MM ({err})"))
}

// Referenced by the API service for request types that carry instants.
pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD HH:MM ({err})"))
}
