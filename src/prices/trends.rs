// src/prices/trends.rs
//! Per-day average price over a trailing window.

use chrono::{DateTime, Datelike, Duration, Utc};
use std::collections::BTreeMap;

use super::PriceRecord;

/// Day key `YYYY-M-D`, unpadded (e.g. `2024-3-5`).
pub fn day_key(dt: &DateTime<Utc>) -> String {
    format!("{}-{}-{}", dt.year(), dt.month(), dt.day())
}

/// Mean price per UTC calendar day for records at or after `now - days`.
///
/// Days without qualifying records do not appear in the output.
pub fn daily_averages(
    records: &[PriceRecord],
    days: u32,
    now: DateTime<Utc>,
) -> BTreeMap<String, f64> {
    // Windows reaching past the representable range keep everything.
    let cutoff = now.checked_sub_signed(Duration::days(i64::from(days)));

    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    let in_window = records
        .iter()
        .filter(|r| cutoff.map_or(true, |c| r.date >= c));
    for r in in_window {
        let slot = sums.entry(day_key(&r.date)).or_insert((0.0, 0));
        slot.0 += r.price;
        slot.1 += 1;
    }

    sums.into_iter()
        .map(|(day, (sum, n))| (day, sum / n as f64))
        .collect()
}
