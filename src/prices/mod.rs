// src/prices/mod.rs
//! Mandi price pipeline: upstream fetch → normalize → (optionally) aggregate.

pub mod client;
pub mod geo;
pub mod normalize;
pub mod trends;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ApiError;

pub use client::DataGovClient;
pub use normalize::{normalize_record, normalize_records, parse_arrival_date, parse_price};

pub const DEFAULT_UNIT: &str = "Quintal";

/// One record exactly as the open-data API returns it.
///
/// Every field is optional; numbers are accepted where strings are expected
/// and empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub commodity: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub market: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub modal_price: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub max_price: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub min_price: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub unit_of_price: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub arrival_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub variety: Option<String>,
}

fn lenient_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match v {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Canonical price record served to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRecord {
    pub commodity: String,
    pub market: String,
    pub price: f64,
    pub unit: String,
    #[serde(serialize_with = "iso_millis")]
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
}

/// `2024-03-25T00:00:00.000Z`
fn iso_millis<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Parameters of one upstream query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuery {
    pub state: Option<String>,
    pub district: Option<String>,
    pub commodity: Option<String>,
    pub limit: u32,
    /// Restrict the upstream projection to a single field.
    pub fields: Option<&'static str>,
    /// Ask for `arrival_date:desc` ordering.
    pub sort_by_arrival: bool,
}

impl PriceQuery {
    /// Latest records for a state/district, newest first.
    pub fn latest(state: &str, district: &str, limit: u32) -> Self {
        Self {
            state: Some(state.to_string()),
            district: Some(district.to_string()),
            commodity: None,
            limit,
            fields: None,
            sort_by_arrival: true,
        }
    }

    pub fn with_commodity(mut self, commodity: &str) -> Self {
        self.commodity = Some(commodity.to_string());
        self
    }

    /// Projection of one field over up to `limit` records, unsorted.
    pub fn field(field: &'static str, limit: u32) -> Self {
        Self {
            state: None,
            district: None,
            commodity: None,
            limit,
            fields: Some(field),
            sort_by_arrival: false,
        }
    }

    pub fn in_state(mut self, state: &str) -> Self {
        self.state = Some(state.to_string());
        self
    }
}

/// Anything that can answer a `PriceQuery` with raw records.
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_records(&self, query: &PriceQuery) -> Result<Vec<RawRecord>, ApiError>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn raw_record_accepts_numbers_and_drops_empty_strings() {
        let r: RawRecord = serde_json::from_value(serde_json::json!({
            "commodity": "Tomato",
            "market": "",
            "modal_price": 1250,
            "max_price": "1400.5",
            "state": null
        }))
        .unwrap();
        assert_eq!(r.commodity.as_deref(), Some("Tomato"));
        assert_eq!(r.market, None);
        assert_eq!(r.modal_price.as_deref(), Some("1250"));
        assert_eq!(r.max_price.as_deref(), Some("1400.5"));
        assert_eq!(r.state, None);
        assert_eq!(r.arrival_date, None);
    }

    #[test]
    fn price_record_serializes_js_style_timestamp_and_skips_missing_geo() {
        let rec = PriceRecord {
            commodity: "Onion".into(),
            market: "Binny Mill".into(),
            price: 1800.0,
            unit: DEFAULT_UNIT.into(),
            date: Utc.with_ymd_and_hms(2024, 3, 25, 0, 0, 0).unwrap(),
            state: Some("Karnataka".into()),
            district: None,
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["date"], "2024-03-25T00:00:00.000Z");
        assert_eq!(v["unit"], "Quintal");
        assert_eq!(v["state"], "Karnataka");
        assert!(v.get("district").is_none());
    }

    #[test]
    fn query_builders() {
        let q = PriceQuery::latest("Karnataka", "Mysuru", 50).with_commodity("Rice");
        assert!(q.sort_by_arrival);
        assert_eq!(q.commodity.as_deref(), Some("Rice"));
        let g = PriceQuery::field("district", 1000).in_state("Kerala");
        assert!(!g.sort_by_arrival);
        assert_eq!(g.fields, Some("district"));
        assert_eq!(g.state.as_deref(), Some("Kerala"));
        assert_eq!(g.district, None);
    }
}
