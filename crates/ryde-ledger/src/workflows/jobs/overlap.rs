use chrono::{NaiveDate, NaiveTime, Timelike};

use super::domain::{Job, JobId};

/// Candidate slot being checked against the rest of the day's schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotQuery {
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub duration_minutes: u32,
    /// Set when editing an existing job so it cannot conflict with itself.
    pub exclude: Option<JobId>,
}

/// Half-open minute window since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    start: u32,
    end: u32,
}

impl Window {
    fn from_parts(time: NaiveTime, duration_minutes: u32) -> Self {
        let start = time.hour() * 60 + time.minute();
        Self {
            start,
            // Saturate so an absurd duration blocks the rest of the day
            // instead of wrapping into an empty window.
            end: start.saturating_add(duration_minutes),
        }
    }

    /// Strict intersection: a job ending exactly when another starts does
    /// not conflict.
    fn intersects(self, other: Window) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Return every job whose window intersects the candidate's. Jobs that
/// cannot occupy a slot (wrong date, inactive status, missing time or
/// duration) are skipped.
pub fn find_conflicts<'a, I>(candidate: &SlotQuery, others: I) -> Vec<&'a Job>
where
    I: IntoIterator<Item = &'a Job>,
{
    let window = Window::from_parts(candidate.booking_time, candidate.duration_minutes);

    others
        .into_iter()
        .filter(|job| candidate.exclude.as_ref() != Some(&job.id))
        .filter(|job| job.booking_date == candidate.booking_date)
        .filter(|job| job.status.blocks_schedule())
        .filter(|job| {
            job_window(job)
                .map(|other| window.intersects(other))
                .unwrap_or(false)
        })
        .collect()
}

fn job_window(job: &Job) -> Option<Window> {
    let time = job.booking_time?;
    let duration = job.duration_minutes?;
    Some(Window::from_parts(time, duration))
}
