use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for persisted jobs, opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Lifecycle of a transport engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Scheduled,
    Completed,
    Cancelled,
    Archived,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Archived => "archived",
        }
    }

    /// Only active slots can block the driver's schedule.
    pub const fn blocks_schedule(self) -> bool {
        matches!(self, Self::Scheduled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    PaymentScheduled,
    Overdue,
    Cancelled,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::PaymentScheduled => "payment-scheduled",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }
}

/// One entry of the payment audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub status: PaymentStatus,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Append-only payment history. The only way to grow it is `appended`,
/// which returns a new log and leaves the original untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentLog(Vec<PaymentEvent>);

impl PaymentLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn appended(&self, event: PaymentEvent) -> Self {
        let mut entries = self.0.clone();
        entries.push(event);
        Self(entries)
    }

    pub fn entries(&self) -> &[PaymentEvent] {
        &self.0
    }

    pub fn last(&self) -> Option<&PaymentEvent> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    NotClaimed,
    Pending,
    Refunded,
}

impl RefundStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotClaimed => "not_claimed",
            Self::Pending => "pending",
            Self::Refunded => "refunded",
        }
    }
}

/// Reimbursable out-of-pocket expense attached to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub kind: String,
    pub amount: f64,
    pub paid_by_driver: bool,
    pub refund: RefundStatus,
}

/// Commission and payment-cycle policy for a booking operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorPolicy {
    pub name: String,
    pub charges_commission: bool,
    pub commission_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_cycle: Option<String>,
}

/// Cost assumptions supplied by the caller for every profit calculation.
/// Never read from ambient state so figures stay reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostSettings {
    pub fuel_price_per_litre: f64,
    pub fuel_efficiency_mpg: f64,
    pub maintenance_cost_per_mile: f64,
    pub default_commission_rate: f64,
    pub default_airport_fee: f64,
    pub target_profit_per_mile: f64,
}

/// One transport engagement. Distances and durations are numeric here;
/// free-text forms ("6.9 mi", "1 hr 15 mins") are parsed at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Human-readable reference, immutable once assigned. Historical
    /// imports may leave it unset until the backfill pass runs.
    pub job_ref: Option<String>,
    pub booking_date: NaiveDate,
    pub booking_time: Option<NaiveTime>,
    pub duration_minutes: Option<u32>,
    pub distance_miles: Option<f64>,
    pub fare: f64,
    pub operator: Option<String>,
    /// Commission percentage applied to this job, overriding the
    /// operator's default when present.
    pub operator_fee: Option<f64>,
    pub include_airport_fee: bool,
    pub airport_fee: Option<f64>,
    pub expenses: Vec<Expense>,
    pub status: JobStatus,
    pub payment_status: PaymentStatus,
    pub payment_due_date: Option<NaiveDate>,
    pub payment_history: PaymentLog,
    pub no_show_at: Option<DateTime<Utc>>,
    pub no_show_wait_minutes: Option<u32>,
    pub original_fare: Option<f64>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// Cached net profit for fast listings; recomputed on any financial
    /// edit. `None` means the engine declined (insufficient data).
    pub profit: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Scheduled start as a naive local instant, when both halves exist.
    pub fn start_at(&self) -> Option<NaiveDateTime> {
        self.booking_time.map(|time| self.booking_date.and_time(time))
    }

    pub fn is_no_show(&self) -> bool {
        self.no_show_at.is_some()
    }
}
