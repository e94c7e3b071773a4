use serde::{Deserialize, Serialize};

use super::domain::{CostSettings, Expense, Job, OperatorPolicy, RefundStatus};

/// Settings express fuel price per litre while efficiency is per gallon,
/// so the conversion constant is load-bearing.
pub const LITRES_PER_GALLON: f64 = 4.546;

/// Floor substituted for zero or missing distance so per-mile figures and
/// cost ratios stay finite.
pub const MIN_BILLABLE_DISTANCE_MILES: f64 = 0.1;

/// Whether operator-refunded expenses still count against profit. The
/// engine never decides this on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpensePolicy {
    DeductAll,
    ExcludeRefunded,
}

/// Per-job profitability breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitBreakdown {
    pub fuel_cost: f64,
    pub maintenance_cost: f64,
    pub operator_fee: f64,
    pub airport_fee: f64,
    pub expenses_total: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    pub profit_per_mile: f64,
    pub hourly_rate: f64,
    pub minute_rate: f64,
    pub meets_target: bool,
    /// True when the minimum-distance floor stood in for the real
    /// distance; callers should surface the approximation.
    pub distance_estimated: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProfitError {
    #[error("fare is missing or zero; profitability is undefined")]
    MissingFare,
}

/// Stateless calculator applying one set of cost assumptions to jobs.
pub struct ProfitEngine {
    settings: CostSettings,
    expense_policy: ExpensePolicy,
}

impl ProfitEngine {
    pub fn new(settings: CostSettings, expense_policy: ExpensePolicy) -> Self {
        Self {
            settings,
            expense_policy,
        }
    }

    pub fn settings(&self) -> &CostSettings {
        &self.settings
    }

    pub fn evaluate(
        &self,
        job: &Job,
        operator: Option<&OperatorPolicy>,
    ) -> Result<ProfitBreakdown, ProfitError> {
        if job.fare == 0.0 {
            return Err(ProfitError::MissingFare);
        }

        let recorded = job.distance_miles.unwrap_or(0.0);
        let distance_estimated = recorded <= 0.0;
        let distance = if distance_estimated {
            MIN_BILLABLE_DISTANCE_MILES
        } else {
            recorded
        };
        let duration_minutes = job.duration_minutes.unwrap_or(0);

        let commission_rate = self.commission_rate(job, operator);
        let operator_fee = job.fare * (commission_rate / 100.0);

        let fuel_cost = (distance / self.settings.fuel_efficiency_mpg)
            * (self.settings.fuel_price_per_litre * LITRES_PER_GALLON);
        let maintenance_cost = distance * self.settings.maintenance_cost_per_mile;

        let airport_fee = if job.include_airport_fee {
            job.airport_fee.unwrap_or(self.settings.default_airport_fee)
        } else {
            0.0
        };

        let expenses_total = self.expenses_total(&job.expenses);

        let total_cost =
            fuel_cost + maintenance_cost + operator_fee + airport_fee + expenses_total;
        let total_profit = job.fare - total_cost;

        let profit_per_mile = total_profit / distance;
        let minute_rate = if duration_minutes > 0 {
            total_profit / f64::from(duration_minutes)
        } else {
            0.0
        };
        let hourly_rate = minute_rate * 60.0;

        Ok(ProfitBreakdown {
            fuel_cost,
            maintenance_cost,
            operator_fee,
            airport_fee,
            expenses_total,
            total_cost,
            total_profit,
            profit_per_mile,
            hourly_rate,
            minute_rate,
            meets_target: profit_per_mile >= self.settings.target_profit_per_mile,
            distance_estimated,
        })
    }

    /// Priority: the job's own rate, then the operator's (when it charges
    /// commission at all), then the caller's default.
    fn commission_rate(&self, job: &Job, operator: Option<&OperatorPolicy>) -> f64 {
        if let Some(rate) = job.operator_fee {
            return rate;
        }
        if let Some(policy) = operator {
            if policy.charges_commission {
                return policy.commission_rate;
            }
        }
        self.settings.default_commission_rate
    }

    fn expenses_total(&self, expenses: &[Expense]) -> f64 {
        expenses
            .iter()
            .filter(|expense| match self.expense_policy {
                ExpensePolicy::DeductAll => true,
                ExpensePolicy::ExcludeRefunded => expense.refund != RefundStatus::Refunded,
            })
            .map(|expense| expense.amount)
            .sum()
    }
}
