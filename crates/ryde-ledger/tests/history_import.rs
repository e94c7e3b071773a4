mod common;

use chrono::{TimeZone, Utc};
use ryde_ledger::workflows::history::JobHistoryImporter;
use ryde_ledger::workflows::jobs::{JobStatus, PaymentStatus};

use common::build_service;

const EXPORT: &str = "\
Date,Time,Duration,Distance,Fare,Parsed Price,Price,Operator,Commission,Notes
2024-11-02,09:30,1 hr 15 mins,12.4 mi,60,,,CityCars,12.5%,airport run
2024-11-02,14:00,45 mins,6.9 mi,,,£45.50,,,
03/11/2024,08:15,2 hours,30 mi,,80,,DirectClient,,return leg
sometime,,,,25,,,,,unusable row
";

#[test]
fn a_full_export_lands_with_references_and_profit() {
    let (service, _) = build_service();
    let now = Utc
        .with_ymd_and_hms(2025, 1, 5, 8, 0, 0)
        .single()
        .expect("valid instant");

    let imported = JobHistoryImporter::import_from_reader(EXPORT.as_bytes(), &service, now)
        .expect("export imports");

    // The dateless row is dropped; everything else lands completed.
    assert_eq!(imported.len(), 3);
    assert!(imported
        .iter()
        .all(|job| job.status == JobStatus::Completed));
    assert!(imported
        .iter()
        .all(|job| job.payment_status == PaymentStatus::Unpaid));

    let refs: Vec<&str> = imported
        .iter()
        .filter_map(|job| job.job_ref.as_deref())
        .collect();
    assert_eq!(
        refs,
        vec!["RYDE02112024-1", "RYDE02112024-2", "RYDE03112024-1"]
    );

    let first = &imported[0];
    assert_eq!(first.duration_minutes, Some(75));
    assert_eq!(first.distance_miles, Some(12.4));
    assert_eq!(first.fare, 60.0);
    assert_eq!(first.operator.as_deref(), Some("CityCars"));
    assert_eq!(first.operator_fee, Some(12.5));
    assert!(first.profit.is_some());

    // The second row's fare came from the formatted price column.
    assert_eq!(imported[1].fare, 45.5);

    // The third row used the pre-parsed price and the day-first date form.
    let third = &imported[2];
    assert_eq!(third.fare, 80.0);
    assert_eq!(third.duration_minutes, Some(120));
    assert_eq!(third.notes.as_deref(), Some("return leg"));
}

#[test]
fn reimporting_continues_the_reference_sequence() {
    let (service, _) = build_service();
    let now = Utc
        .with_ymd_and_hms(2025, 1, 5, 8, 0, 0)
        .single()
        .expect("valid instant");

    JobHistoryImporter::import_from_reader(EXPORT.as_bytes(), &service, now)
        .expect("first import");

    let late_batch = "\
Date,Time,Duration,Distance,Fare,Parsed Price,Price,Operator,Commission,Notes
2024-11-02,20:00,30 mins,4 mi,18,,,,,
";
    let imported = JobHistoryImporter::import_from_reader(late_batch.as_bytes(), &service, now)
        .expect("second import");

    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].job_ref.as_deref(), Some("RYDE02112024-3"));
}
