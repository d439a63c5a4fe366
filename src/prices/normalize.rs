// src/prices/normalize.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use metrics::counter;

use super::{PriceRecord, RawRecord, DEFAULT_UNIT};

/// Map one upstream record to a `PriceRecord`.
///
/// Returns `None` when commodity, market, or both price fields are missing.
/// `now` is used as the date when `arrival_date` is absent or unparsable.
pub fn normalize_record(raw: &RawRecord, now: DateTime<Utc>) -> Option<PriceRecord> {
    let commodity = raw.commodity.as_deref().filter(|s| !s.is_empty())?;
    let market = raw.market.as_deref().filter(|s| !s.is_empty())?;
    let price_raw = raw
        .modal_price
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| raw.max_price.as_deref().filter(|s| !s.is_empty()))?;

    Some(PriceRecord {
        commodity: commodity.to_string(),
        market: market.to_string(),
        price: parse_price(price_raw),
        unit: raw
            .unit_of_price
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_UNIT.to_string()),
        date: parse_arrival_date(raw.arrival_date.as_deref(), now),
        state: raw.state.clone(),
        district: raw.district.clone(),
    })
}

/// Normalize a batch, silently dropping malformed records.
pub fn normalize_records(raw: &[RawRecord], now: DateTime<Utc>) -> Vec<PriceRecord> {
    let out: Vec<PriceRecord> = raw
        .iter()
        .filter_map(|r| normalize_record(r, now))
        .collect();
    let dropped = raw.len() - out.len();
    if dropped > 0 {
        tracing::debug!(dropped, total = raw.len(), "dropped malformed price records");
        counter!("price_records_dropped_total").increment(dropped as u64);
    }
    out
}

/// Parse the leading number of a price string (`"1,250"` is 1,
/// `"12.5 Rs"` is 12.5). No numeric prefix, or a non-finite value, gives `0.0`.
pub fn parse_price(s: &str) -> f64 {
    numeric_prefix(s.trim_start())
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Longest prefix of `s` shaped like a decimal literal: sign, digits,
/// optional fraction, optional exponent.
fn numeric_prefix(s: &str) -> &str {
    let b = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(b.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut seen_digits = int_end > end;
    end = int_end;

    if b.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if seen_digits || frac_end > end + 1 {
            seen_digits = true;
            end = frac_end;
        }
    }
    if !seen_digits {
        return "";
    }

    if matches!(b.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(b.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    &s[..end]
}

/// Parse an upstream arrival date.
///
/// Values containing `/` are read strictly as `DD/MM/YYYY` (midnight UTC).
/// Anything else goes through a handful of ISO-ish formats. Absent or
/// unparsable input yields `now`.
pub fn parse_arrival_date(s: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(s) = s.map(str::trim).filter(|s| !s.is_empty()) else {
        return now;
    };
    let parsed = if s.contains('/') {
        parse_day_month_year(s)
    } else {
        parse_generic(s)
    };
    parsed.unwrap_or(now)
}

fn parse_day_month_year(s: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = s.split('/').map(str::trim).collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_generic(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
