//! Job financial and scheduling engine: per-job profitability, schedule
//! overlap protection, the payment-status state machine and its audit
//! trail, the no-show workflow, and per-date reference allocation.
//!
//! Everything here is a stateless computation over caller-supplied data;
//! persistence and cross-process serialization stay behind
//! [`repository::JobRepository`].

pub mod domain;
pub mod noshow;
pub mod overlap;
pub mod parse;
pub mod payment;
pub mod profit;
pub mod reference;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CostSettings, Expense, Job, JobId, JobStatus, OperatorPolicy, PaymentEvent, PaymentLog,
    PaymentStatus, RefundStatus,
};
pub use noshow::{NoShowError, NoShowPaymentRule, NoShowRequest, NO_SHOW_GRACE_MINUTES};
pub use overlap::{find_conflicts, SlotQuery};
pub use payment::{
    apply_transition, due_date_for_cycle, schedule_on_creation, DueDateEstimate, PaymentError,
    PaymentTransition, PaymentUpdate,
};
pub use profit::{
    ExpensePolicy, ProfitBreakdown, ProfitEngine, ProfitError, LITRES_PER_GALLON,
    MIN_BILLABLE_DISTANCE_MILES,
};
pub use reference::{backfill, date_prefix, next_reference, BackfillAssignment, JOB_REF_TAG};
pub use repository::{JobRepository, RepositoryError};
pub use router::{job_router, CreateJobRequest, JobView, RescheduleRequest};
pub use service::{FinancialUpdate, JobService, JobServiceError, NewJob};
