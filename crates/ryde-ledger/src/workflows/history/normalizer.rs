use crate::workflows::jobs::parse::{
    parse_distance_miles, parse_duration_minutes, parse_money,
};
use crate::workflows::jobs::NewJob;

use super::parser::{parse_booking_date, parse_booking_time, HistoryRow};

/// Normalize one duck-typed export row into the canonical job shape. The
/// fallback-chain handling for the three price columns lives here and
/// nowhere else; the core never sees unparsed text.
pub(crate) fn normalize_row(row: HistoryRow) -> Option<NewJob> {
    let booking_date = parse_booking_date(&row.date)?;

    Some(NewJob {
        booking_date,
        booking_time: row.time.as_deref().and_then(parse_booking_time),
        duration_minutes: row.duration.as_deref().and_then(parse_duration_minutes),
        distance_miles: row.distance.as_deref().and_then(parse_distance_miles),
        fare: resolve_fare(&row),
        operator: row.operator,
        operator_fee: row
            .commission
            .as_deref()
            .and_then(|raw| raw.trim_end_matches('%').trim().parse::<f64>().ok()),
        include_airport_fee: false,
        airport_fee: None,
        expenses: Vec::new(),
        notes: row.notes,
    })
}

/// Fare resolution priority: numeric fare column, numeric parsed-price
/// column, numeric price column, then a best-effort parse of the price
/// column as currency text. Unresolvable fares become zero and the
/// profit engine reports insufficient data downstream.
fn resolve_fare(row: &HistoryRow) -> f64 {
    if let Some(fare) = numeric(row.fare.as_deref()) {
        return fare;
    }
    if let Some(parsed) = numeric(row.parsed_price.as_deref()) {
        return parsed;
    }
    if let Some(price) = numeric(row.price.as_deref()) {
        return price;
    }
    row.price
        .as_deref()
        .and_then(parse_money)
        .unwrap_or(0.0)
}

fn numeric(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
}
