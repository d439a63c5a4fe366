// src/prices/geo.rs
use std::collections::BTreeSet;

use super::RawRecord;

pub const GEO_LIMIT: u32 = 1000;

/// Distinct non-empty values picked from each record, sorted.
pub fn distinct_sorted<F>(records: &[RawRecord], pick: F) -> Vec<String>
where
    F: Fn(&RawRecord) -> Option<&str>,
{
    records
        .iter()
        .filter_map(|r| pick(r))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn states(records: &[RawRecord]) -> Vec<String> {
    distinct_sorted(records, |r| r.state.as_deref())
}

pub fn districts(records: &[RawRecord]) -> Vec<String> {
    distinct_sorted(records, |r| r.district.as_deref())
}
