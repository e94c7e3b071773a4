use super::common::{base_job, booking_date, time};
use crate::workflows::jobs::domain::{JobId, JobStatus};
use crate::workflows::jobs::overlap::{find_conflicts, SlotQuery};

fn query(hour: u32, minute: u32, duration: u32) -> SlotQuery {
    SlotQuery {
        booking_date: booking_date(),
        booking_time: time(hour, minute),
        duration_minutes: duration,
        exclude: None,
    }
}

#[test]
fn boundary_touch_is_not_a_conflict() {
    let mut other = base_job("job-overlap-1");
    other.booking_time = Some(time(9, 30));
    other.duration_minutes = Some(30);

    // [09:00, 09:30) against [09:30, 10:00).
    let conflicts = find_conflicts(&query(9, 0, 30), [&other]);
    assert!(conflicts.is_empty());
}

#[test]
fn one_minute_spill_conflicts() {
    let mut other = base_job("job-overlap-2");
    other.booking_time = Some(time(9, 30));
    other.duration_minutes = Some(30);

    // [09:00, 09:31) against [09:30, 10:00).
    let conflicts = find_conflicts(&query(9, 0, 31), [&other]);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].id, other.id);
}

#[test]
fn containment_conflicts() {
    let mut other = base_job("job-overlap-3");
    other.booking_time = Some(time(9, 0));
    other.duration_minutes = Some(120);

    let conflicts = find_conflicts(&query(9, 30, 15), [&other]);
    assert_eq!(conflicts.len(), 1);
}

#[test]
fn inactive_jobs_never_block_a_slot() {
    let mut cancelled = base_job("job-overlap-4");
    cancelled.status = JobStatus::Cancelled;
    let mut completed = base_job("job-overlap-5");
    completed.status = JobStatus::Completed;
    let mut archived = base_job("job-overlap-6");
    archived.status = JobStatus::Archived;

    let conflicts = find_conflicts(&query(9, 0, 30), [&cancelled, &completed, &archived]);
    assert!(conflicts.is_empty());
}

#[test]
fn jobs_without_a_window_are_skipped() {
    let mut no_time = base_job("job-overlap-7");
    no_time.booking_time = None;
    let mut no_duration = base_job("job-overlap-8");
    no_duration.duration_minutes = None;

    let conflicts = find_conflicts(&query(9, 0, 30), [&no_time, &no_duration]);
    assert!(conflicts.is_empty());
}

#[test]
fn editing_excludes_the_job_itself() {
    let job = base_job("job-overlap-9");

    let mut query = query(9, 0, 30);
    query.exclude = Some(job.id.clone());
    assert!(find_conflicts(&query, [&job]).is_empty());

    query.exclude = Some(JobId("job-other".to_string()));
    assert_eq!(find_conflicts(&query, [&job]).len(), 1);
}

#[test]
fn oversized_durations_saturate_instead_of_wrapping() {
    let mut other = base_job("job-overlap-11");
    other.booking_time = Some(time(0, 5));
    other.duration_minutes = Some(u32::MAX);

    // A wrapped window would end before it starts and miss this clash.
    let conflicts = find_conflicts(&query(23, 0, 30), [&other]);
    assert_eq!(conflicts.len(), 1);

    let oversized = SlotQuery {
        booking_date: booking_date(),
        booking_time: time(23, 0),
        duration_minutes: u32::MAX,
        exclude: None,
    };
    let early = base_job("job-overlap-12");
    assert_eq!(find_conflicts(&oversized, [&early]).len(), 0);
}

#[test]
fn other_dates_never_conflict() {
    let mut other = base_job("job-overlap-10");
    other.booking_date = booking_date().succ_opt().expect("valid date");

    let conflicts = find_conflicts(&query(9, 0, 30), [&other]);
    assert!(conflicts.is_empty());
}
