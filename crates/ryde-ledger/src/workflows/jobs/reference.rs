use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::domain::JobId;

/// Leading tag shared by every job reference.
pub const JOB_REF_TAG: &str = "RYDE";

/// Prefix for one calendar date: `RYDE<DDMMYYYY>`.
pub fn date_prefix(date: NaiveDate) -> String {
    format!("{JOB_REF_TAG}{}", date.format("%d%m%Y"))
}

/// Allocate the next reference for a booking date given every previously
/// allocated reference. N is 1 + the highest index found for the date's
/// prefix; 1 when the date is unseen.
pub fn next_reference<'a, I>(date: NaiveDate, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let prefix = date_prefix(date);
    let next = max_index(&prefix, existing) + 1;
    format!("{prefix}-{next}")
}

/// Assignment produced by the backfill pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillAssignment {
    pub id: JobId,
    pub job_ref: String,
}

/// Assign references to historical jobs in bulk. Jobs are grouped by
/// normalized date (ascending), kept in their supplied creation order
/// within a group, and the starting index is computed once per group so
/// indices stay contiguous.
pub fn backfill<'a, I>(jobs: &[(JobId, NaiveDate)], existing: I) -> Vec<BackfillAssignment>
where
    I: IntoIterator<Item = &'a str>,
{
    let existing: Vec<&str> = existing.into_iter().collect();

    let mut groups: BTreeMap<NaiveDate, Vec<&JobId>> = BTreeMap::new();
    for (id, date) in jobs {
        groups.entry(*date).or_default().push(id);
    }

    let mut assignments = Vec::with_capacity(jobs.len());
    for (date, ids) in groups {
        let prefix = date_prefix(date);
        let mut next = max_index(&prefix, existing.iter().copied()) + 1;
        for id in ids {
            assignments.push(BackfillAssignment {
                id: id.clone(),
                job_ref: format!("{prefix}-{next}"),
            });
            next += 1;
        }
    }

    assignments
}

fn max_index<'a, I>(prefix: &str, existing: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .filter_map(|reference| parse_index(prefix, reference))
        .max()
        .unwrap_or(0)
}

fn parse_index(prefix: &str, reference: &str) -> Option<u32> {
    let rest = reference.strip_prefix(prefix)?;
    let digits = rest.strip_prefix('-')?;
    digits.parse::<u32>().ok()
}
