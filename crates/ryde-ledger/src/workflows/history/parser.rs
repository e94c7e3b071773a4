use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer};
use std::io::Read;

/// One raw row of a job-history export, before normalization. Exports
/// from older spreadsheets are inconsistent about which price column is
/// populated, so all money columns stay text until the normalizer runs.
#[derive(Debug, Deserialize)]
pub(crate) struct HistoryRow {
    #[serde(rename = "Date")]
    pub(crate) date: String,
    #[serde(rename = "Time", default, deserialize_with = "empty_string_as_none")]
    pub(crate) time: Option<String>,
    #[serde(rename = "Duration", default, deserialize_with = "empty_string_as_none")]
    pub(crate) duration: Option<String>,
    #[serde(rename = "Distance", default, deserialize_with = "empty_string_as_none")]
    pub(crate) distance: Option<String>,
    #[serde(rename = "Fare", default, deserialize_with = "empty_string_as_none")]
    pub(crate) fare: Option<String>,
    #[serde(
        rename = "Parsed Price",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) parsed_price: Option<String>,
    #[serde(rename = "Price", default, deserialize_with = "empty_string_as_none")]
    pub(crate) price: Option<String>,
    #[serde(rename = "Operator", default, deserialize_with = "empty_string_as_none")]
    pub(crate) operator: Option<String>,
    #[serde(
        rename = "Commission",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) commission: Option<String>,
    #[serde(rename = "Notes", default, deserialize_with = "empty_string_as_none")]
    pub(crate) notes: Option<String>,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<HistoryRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader.deserialize::<HistoryRow>().collect()
}

pub(crate) fn parse_booking_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .ok()
}

pub(crate) fn parse_booking_time(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .ok()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
