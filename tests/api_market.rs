// tests/api_market.rs
//
// Market price routes against an in-process fixture source.
// The fixture records every PriceQuery so tests can check what would have
// been sent upstream.

use std::sync::{Arc, Mutex};

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _;

use farmer_app_api::api::{self, AppState};
use farmer_app_api::clock::FixedClock;
use farmer_app_api::config::QueryDefaults;
use farmer_app_api::error::{ApiError, UpstreamError};
use farmer_app_api::prices::{PriceQuery, PriceSource, RawRecord};
use farmer_app_api::schemes::SchemeCatalog;

struct FixtureSource {
    result: Result<Vec<RawRecord>, ApiError>,
    calls: Mutex<Vec<PriceQuery>>,
}

impl FixtureSource {
    fn ok(records: Vec<RawRecord>) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(records),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing(err: ApiError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(err),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<PriceQuery> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PriceSource for FixtureSource {
    async fn fetch_records(&self, query: &PriceQuery) -> Result<Vec<RawRecord>, ApiError> {
        self.calls.lock().unwrap().push(query.clone());
        self.result.clone()
    }
    fn name(&self) -> &'static str {
        "fixture"
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap()
}

fn app(source: Arc<FixtureSource>) -> Router {
    api::create_router(AppState {
        prices: source,
        schemes: Arc::new(SchemeCatalog::default_seed()),
        clock: Arc::new(FixedClock(now())),
        defaults: Arc::new(QueryDefaults::default()),
    })
}

fn record(commodity: &str, market: &str, modal: Option<&str>, date: &str) -> RawRecord {
    RawRecord {
        commodity: Some(commodity.into()),
        market: Some(market.into()),
        modal_price: modal.map(Into::into),
        arrival_date: Some(date.into()),
        state: Some("Karnataka".into()),
        district: Some("Bengaluru Urban".into()),
        ..Default::default()
    }
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn latest_uses_defaults_and_drops_malformed() {
    let src = FixtureSource::ok(vec![
        record("Tomato", "Binny Mill", Some("1200"), "29/03/2024"),
        record("Onion", "Binny Mill", None, "29/03/2024"),
        record("Beans", "KR Market", Some("3400.50"), "28/03/2024"),
    ]);
    let (status, v) = get_json(app(src.clone()), "/api/market-prices").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["success"], true);
    assert_eq!(v["count"], 2);
    assert_eq!(v["data"][0]["commodity"], "Tomato");
    assert_eq!(v["data"][0]["price"], 1200.0);
    assert_eq!(v["data"][0]["unit"], "Quintal");
    assert_eq!(v["data"][0]["date"], "2024-03-29T00:00:00.000Z");
    assert_eq!(v["data"][1]["price"], 3400.5);

    let calls = src.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        PriceQuery::latest("Karnataka", "Bengaluru Urban", 50)
    );
}

#[tokio::test]
async fn latest_passes_location_and_limit() {
    let src = FixtureSource::ok(vec![]);
    let (status, v) = get_json(
        app(src.clone()),
        "/api/market-prices?state=Kerala&district=Ernakulam&limit=5",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["count"], 0);
    assert_eq!(src.calls()[0], PriceQuery::latest("Kerala", "Ernakulam", 5));
}

#[tokio::test]
async fn invalid_limit_is_400_without_upstream_call() {
    let src = FixtureSource::ok(vec![]);
    let (status, v) = get_json(app(src.clone()), "/api/market-prices?limit=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["success"], false);
    assert!(v["error"].as_str().unwrap().contains("limit"));
    assert!(src.calls().is_empty());
}

#[tokio::test]
async fn malformed_query_string_is_json_400() {
    let src = FixtureSource::ok(vec![]);
    for uri in [
        "/api/market-prices?limit=1&limit=2",
        "/api/market-prices/search?q=tom&q=oni",
        "/api/market-prices/trends/Tomato?days=3&days=4",
    ] {
        let (status, v) = get_json(app(src.clone()), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(v["success"], false, "{uri}");
        assert!(v["error"].as_str().unwrap().contains("duplicate field"), "{uri}");
    }
    assert!(src.calls().is_empty());
}

#[tokio::test]
async fn commodity_route_adds_commodity_filter() {
    let src = FixtureSource::ok(vec![record("Potato", "Yeshwanthpur", Some("900"), "30/03/2024")]);
    let (status, v) = get_json(app(src.clone()), "/api/market-prices/commodity/Potato").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["commodity"], "Potato");
    assert_eq!(v["count"], 1);
    assert_eq!(src.calls()[0].commodity.as_deref(), Some("Potato"));
    assert!(src.calls()[0].sort_by_arrival);
}

#[tokio::test]
async fn search_requires_q_and_never_calls_upstream() {
    let src = FixtureSource::ok(vec![]);
    let (status, v) = get_json(app(src.clone()), "/api/market-prices/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["success"], false);
    assert_eq!(v["error"], "Query parameter \"q\" is required");
    assert!(src.calls().is_empty());
}

#[tokio::test]
async fn search_filters_commodity_case_insensitively() {
    let src = FixtureSource::ok(vec![
        record("Tomato", "Binny Mill", Some("1200"), "29/03/2024"),
        record("Green Chilli", "Binny Mill", Some("4000"), "29/03/2024"),
        record("Cherry TOMATO", "KR Market", Some("5000"), "29/03/2024"),
    ]);
    let (status, v) = get_json(app(src.clone()), "/api/market-prices/search?q=toMat").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["query"], "toMat");
    assert_eq!(v["count"], 2);
    assert_eq!(src.calls()[0].limit, 100);
    assert_eq!(src.calls()[0].commodity, None);
}

#[tokio::test]
async fn trends_average_per_day_within_window() {
    let src = FixtureSource::ok(vec![
        record("Tomato", "Binny Mill", Some("10"), "25/03/2024"),
        record("Tomato", "KR Market", Some("20"), "25/03/2024"),
        record("Tomato", "Binny Mill", Some("30"), "26/03/2024"),
        record("Tomato", "Binny Mill", Some("99"), "01/01/2024"),
    ]);
    let (status, v) = get_json(app(src.clone()), "/api/market-prices/trends/Tomato").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["commodity"], "Tomato");
    assert_eq!(v["days"], 30);
    assert_eq!(v["data"], json!({ "2024-3-25": 15.0, "2024-3-26": 30.0 }));

    let q = &src.calls()[0];
    assert_eq!(q.limit, 200);
    assert_eq!(q.commodity.as_deref(), Some("Tomato"));
}

#[tokio::test]
async fn trends_window_is_configurable() {
    let src = FixtureSource::ok(vec![
        record("Tomato", "Binny Mill", Some("10"), "29/03/2024"),
        record("Tomato", "Binny Mill", Some("30"), "20/03/2024"),
    ]);
    let (_, v) = get_json(app(src), "/api/market-prices/trends/Tomato?days=2").await;
    assert_eq!(v["days"], 2);
    assert_eq!(v["data"], json!({ "2024-3-29": 10.0 }));

    let src = FixtureSource::ok(vec![]);
    let (status, _) = get_json(app(src), "/api/market-prices/trends/Tomato?days=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn states_are_distinct_sorted_and_non_empty() {
    let mk = |s: Option<&str>| RawRecord {
        state: s.map(Into::into),
        ..Default::default()
    };
    let src = FixtureSource::ok(vec![
        mk(Some("Kerala")),
        mk(Some("Karnataka")),
        mk(Some("")),
        mk(None),
        mk(Some("Kerala")),
    ]);
    let (status, v) = get_json(app(src.clone()), "/api/market-prices/states").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["count"], 2);
    assert_eq!(v["data"], json!(["Karnataka", "Kerala"]));
    assert_eq!(src.calls()[0], PriceQuery::field("state", 1000));
}

#[tokio::test]
async fn districts_are_filtered_by_state() {
    let mk = |d: &str| RawRecord {
        district: Some(d.into()),
        ..Default::default()
    };
    let src = FixtureSource::ok(vec![mk("Mysuru"), mk("Bengaluru Urban"), mk("Mysuru")]);
    let (status, v) = get_json(app(src.clone()), "/api/market-prices/districts/Karnataka").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["state"], "Karnataka");
    assert_eq!(v["data"], json!(["Bengaluru Urban", "Mysuru"]));
    assert_eq!(
        src.calls()[0],
        PriceQuery::field("district", 1000).in_state("Karnataka")
    );
}

#[tokio::test]
async fn upstream_failure_is_500_with_message() {
    let src = FixtureSource::failing(ApiError::Upstream(UpstreamError::Status(503)));
    let (status, v) = get_json(app(src), "/api/market-prices").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(v["success"], false);
    assert_eq!(v["error"], "Failed to fetch market prices");
    assert_eq!(v["message"], "API returned status 503");
}

#[tokio::test]
async fn configuration_failure_is_500_with_route_summary() {
    let src = FixtureSource::failing(ApiError::Configuration(
        "DATA_GOV_API_KEY is not set in environment variables".into(),
    ));
    let (status, v) = get_json(app(src), "/api/market-prices/states").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(v["error"], "Failed to fetch states");
    assert!(v["message"].as_str().unwrap().contains("DATA_GOV_API_KEY"));
}
