use crate::infra::{default_operators, parse_date, InMemoryJobRepository};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::Args;
use ryde_ledger::config::AppConfig;
use ryde_ledger::error::AppError;
use ryde_ledger::workflows::history::JobHistoryImporter;
use ryde_ledger::workflows::jobs::parse::{parse_distance_miles, parse_duration_minutes};
use ryde_ledger::workflows::jobs::router::{parse_datetime, parse_time};
use ryde_ledger::workflows::jobs::{
    ExpensePolicy, Job, JobId, JobService, JobServiceError, JobStatus, NewJob, NoShowPaymentRule,
    NoShowRequest, PaymentLog, PaymentStatus, PaymentTransition, ProfitBreakdown, ProfitEngine,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ProfitArgs {
    /// Agreed fare in pounds
    #[arg(long)]
    pub(crate) fare: f64,
    /// Distance in its free-text form, e.g. "12.4 mi"
    #[arg(long)]
    pub(crate) distance: Option<String>,
    /// Duration in its free-text form, e.g. "1 hr 15 mins"
    #[arg(long)]
    pub(crate) duration: Option<String>,
    /// Operator name; matched against the built-in operator policies
    #[arg(long)]
    pub(crate) operator: Option<String>,
    /// Commission percentage override for this job
    #[arg(long)]
    pub(crate) commission: Option<f64>,
    /// Include the airport pickup fee
    #[arg(long)]
    pub(crate) airport_fee: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Booking date for the demo jobs (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Override the demo clock ("YYYY-MM-DD HH:MM", UTC). Defaults to
    /// the evening of the booking date so the no-show grace has elapsed.
    #[arg(long, value_parser = parse_demo_clock)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Optional CSV export of historical jobs to import at the end.
    #[arg(long)]
    pub(crate) history_csv: Option<PathBuf>,
}

fn parse_demo_clock(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_datetime(raw).map(|naive| Utc.from_utc_datetime(&naive))
}

/// One-shot pricing without touching storage.
pub(crate) fn run_profit(args: ProfitArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let engine = ProfitEngine::new(config.costs, ExpensePolicy::DeductAll);

    let operators = default_operators();
    let operator = args
        .operator
        .as_deref()
        .and_then(|name| operators.iter().find(|policy| policy.name == name));

    let job = Job {
        id: JobId("adhoc".to_string()),
        job_ref: None,
        booking_date: Local::now().date_naive(),
        booking_time: None,
        duration_minutes: args.duration.as_deref().and_then(parse_duration_minutes),
        distance_miles: args.distance.as_deref().and_then(parse_distance_miles),
        fare: args.fare,
        operator: args.operator.clone(),
        operator_fee: args.commission,
        include_airport_fee: args.airport_fee,
        airport_fee: None,
        expenses: Vec::new(),
        status: JobStatus::Scheduled,
        payment_status: PaymentStatus::Unpaid,
        payment_due_date: None,
        payment_history: PaymentLog::new(),
        no_show_at: None,
        no_show_wait_minutes: None,
        original_fare: None,
        cancellation_reason: None,
        cancelled_at: None,
        notes: None,
        profit: None,
        created_at: Utc::now(),
    };

    let breakdown = engine.evaluate(&job, operator).map_err(JobServiceError::from)?;
    render_breakdown(&breakdown, args.fare);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let now = args.now.unwrap_or_else(|| {
        Utc.from_utc_datetime(&date.and_hms_opt(20, 0, 0).unwrap_or_default())
    });

    let repository = Arc::new(InMemoryJobRepository::default());
    let service = JobService::new(
        repository,
        config.costs,
        ExpensePolicy::DeductAll,
        default_operators(),
    );

    println!("Job ledger demo for {date}");

    let airport_run = service.create(
        NewJob {
            booking_date: date,
            booking_time: parse_time("09:00").ok(),
            duration_minutes: parse_duration_minutes("1 hr 15 mins"),
            distance_miles: parse_distance_miles("12.4 mi"),
            fare: 60.0,
            operator: Some("CityCars".to_string()),
            operator_fee: None,
            include_airport_fee: true,
            airport_fee: None,
            expenses: Vec::new(),
            notes: Some("terminal 2 pickup".to_string()),
        },
        now,
    )?;
    println!(
        "- Booked {} at 09:00 ({}, due {})",
        airport_run.job_ref.as_deref().unwrap_or("?"),
        airport_run.payment_status.label(),
        airport_run
            .payment_due_date
            .map(|due| due.to_string())
            .unwrap_or_else(|| "n/a".to_string()),
    );

    let breakdown = service.profit_breakdown(&airport_run.id)?;
    render_breakdown(&breakdown, airport_run.fare);

    let evening_run = service.create(
        NewJob {
            booking_date: date,
            booking_time: parse_time("18:30").ok(),
            duration_minutes: parse_duration_minutes("45 mins"),
            distance_miles: parse_distance_miles("6.9 mi"),
            fare: 28.0,
            operator: None,
            operator_fee: None,
            include_airport_fee: false,
            airport_fee: None,
            expenses: Vec::new(),
            notes: None,
        },
        now,
    )?;
    println!(
        "- Booked {} at 18:30",
        evening_run.job_ref.as_deref().unwrap_or("?")
    );

    let clash = service.create(
        NewJob {
            booking_date: date,
            booking_time: parse_time("09:30").ok(),
            duration_minutes: parse_duration_minutes("30 mins"),
            distance_miles: None,
            fare: 15.0,
            operator: None,
            operator_fee: None,
            include_airport_fee: false,
            airport_fee: None,
            expenses: Vec::new(),
            notes: None,
        },
        now,
    );
    match clash {
        Err(JobServiceError::ScheduleConflict(refs)) => {
            println!("- Rejected a 09:30 booking: clashes with {}", refs.join(", "));
        }
        Ok(job) => println!(
            "- Unexpectedly accepted overlapping booking {}",
            job.job_ref.as_deref().unwrap_or("?")
        ),
        Err(err) => return Err(err.into()),
    }

    let paid = service.transition_payment(
        &evening_run.id,
        PaymentTransition {
            to: PaymentStatus::Paid,
            due_date: None,
            note: Some("cash on dropoff".to_string()),
        },
        now,
    )?;
    println!(
        "- Settled {}: {} history entries",
        paid.job_ref.as_deref().unwrap_or("?"),
        paid.payment_history.len()
    );

    let marked = service.mark_no_show(
        &airport_run.id,
        NoShowRequest {
            wait_minutes: 25,
            evidence: Some("no answer after two calls".to_string()),
            payment: NoShowPaymentRule::Half,
            expenses: Vec::new(),
        },
        now.fixed_offset(),
    )?;
    println!(
        "- No-show on {}: fare {:.2} -> {:.2}",
        marked.job_ref.as_deref().unwrap_or("?"),
        marked.original_fare.unwrap_or(marked.fare),
        marked.fare
    );

    let reverted = service.revert_no_show(&airport_run.id)?;
    println!(
        "- Reverted the no-show: fare back to {:.2}, profit {}",
        reverted.fare,
        reverted
            .profit
            .map(|profit| format!("{profit:.2}"))
            .unwrap_or_else(|| "n/a".to_string()),
    );

    if let Some(path) = args.history_csv {
        let imported = JobHistoryImporter::import_from_path(&path, &service, now)?;
        println!("\nImported {} historical jobs from {}", imported.len(), path.display());
        for job in &imported {
            println!(
                "  - {} on {}: fare {:.2}, profit {}",
                job.job_ref.as_deref().unwrap_or("?"),
                job.booking_date,
                job.fare,
                job.profit
                    .map(|profit| format!("{profit:.2}"))
                    .unwrap_or_else(|| "n/a".to_string()),
            );
        }
    }

    Ok(())
}

fn render_breakdown(breakdown: &ProfitBreakdown, fare: f64) {
    println!("  Fare {fare:.2} breaks down as:");
    println!("    fuel        {:.2}", breakdown.fuel_cost);
    println!("    maintenance {:.2}", breakdown.maintenance_cost);
    println!("    commission  {:.2}", breakdown.operator_fee);
    if breakdown.airport_fee > 0.0 {
        println!("    airport fee {:.2}", breakdown.airport_fee);
    }
    if breakdown.expenses_total > 0.0 {
        println!("    expenses    {:.2}", breakdown.expenses_total);
    }
    println!("    profit      {:.2}", breakdown.total_profit);
    println!(
        "    {:.2}/mile ({}) | {:.2}/hour",
        breakdown.profit_per_mile,
        if breakdown.meets_target {
            "meets target"
        } else {
            "below target"
        },
        breakdown.hourly_rate
    );
}
