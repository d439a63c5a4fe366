//! `/api/market-prices/*`: proxied mandi prices.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::error::{ApiError, HandlerError, Summarize};
use crate::prices::geo::{self, GEO_LIMIT};
use crate::prices::trends::daily_averages;
use crate::prices::{normalize_records, PriceQuery, PriceRecord};

/// Upstream page size for commodity search.
pub const SEARCH_LIMIT: u32 = 100;
/// Upstream page size for trend aggregation.
pub const TREND_LIMIT: u32 = 200;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/market-prices", get(latest))
        .route("/api/market-prices/commodity/{commodity}", get(by_commodity))
        .route("/api/market-prices/search", get(search))
        .route("/api/market-prices/trends/{commodity}", get(trends))
        .route("/api/market-prices/states", get(states))
        .route("/api/market-prices/districts/{state}", get(districts))
}

#[derive(Debug, Default, Deserialize)]
pub struct PriceParams {
    pub state: Option<String>,
    pub district: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendParams {
    pub state: Option<String>,
    pub district: Option<String>,
    pub days: Option<String>,
}

fn or_default(v: Option<String>, default: &str) -> String {
    v.filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse an optional positive integer query parameter.
fn positive_param(name: &str, raw: Option<&str>, default: u32) -> Result<u32, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => s.parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
            ApiError::Validation(format!(
                "Query parameter \"{name}\" must be a positive integer"
            ))
        }),
    }
}

/// Fetch one page from upstream and normalize it.
async fn fetch_prices(
    state: &AppState,
    query: &PriceQuery,
) -> Result<Vec<PriceRecord>, ApiError> {
    let raw = state.prices.fetch_records(query).await?;
    Ok(normalize_records(&raw, state.clock.now()))
}

/// GET /api/market-prices?state=&district=&limit=
async fn latest(
    State(state): State<AppState>,
    params: Result<Query<PriceParams>, QueryRejection>,
) -> Result<Json<Value>, HandlerError> {
    const SUMMARY: &str = "Failed to fetch market prices";
    let Query(p) = params.summarize(SUMMARY)?;
    let limit =
        positive_param("limit", p.limit.as_deref(), state.defaults.limit).summarize(SUMMARY)?;
    let query = PriceQuery::latest(
        &or_default(p.state, &state.defaults.state),
        &or_default(p.district, &state.defaults.district),
        limit,
    );

    let prices = fetch_prices(&state, &query).await.summarize(SUMMARY)?;
    Ok(Json(json!({
        "success": true,
        "count": prices.len(),
        "data": prices,
    })))
}

/// GET /api/market-prices/commodity/{commodity}
async fn by_commodity(
    State(state): State<AppState>,
    Path(commodity): Path<String>,
    params: Result<Query<PriceParams>, QueryRejection>,
) -> Result<Json<Value>, HandlerError> {
    const SUMMARY: &str = "Failed to fetch commodity prices";
    let Query(p) = params.summarize(SUMMARY)?;
    let limit =
        positive_param("limit", p.limit.as_deref(), state.defaults.limit).summarize(SUMMARY)?;
    let query = PriceQuery::latest(
        &or_default(p.state, &state.defaults.state),
        &or_default(p.district, &state.defaults.district),
        limit,
    )
    .with_commodity(&commodity);

    let prices = fetch_prices(&state, &query).await.summarize(SUMMARY)?;
    Ok(Json(json!({
        "success": true,
        "commodity": commodity,
        "count": prices.len(),
        "data": prices,
    })))
}

/// GET /api/market-prices/search?q=
///
/// Case-insensitive substring match on commodity over the latest
/// `SEARCH_LIMIT` records of the state/district.
async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Value>, HandlerError> {
    const SUMMARY: &str = "Search failed";
    let Query(p) = params.summarize(SUMMARY)?;
    let q = p
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::missing_query_param("q"))
        .summarize(SUMMARY)?;

    let query = PriceQuery::latest(
        &or_default(p.state, &state.defaults.state),
        &or_default(p.district, &state.defaults.district),
        SEARCH_LIMIT,
    );
    let needle = q.to_lowercase();
    let prices: Vec<PriceRecord> = fetch_prices(&state, &query)
        .await
        .summarize(SUMMARY)?
        .into_iter()
        .filter(|r| r.commodity.to_lowercase().contains(&needle))
        .collect();

    Ok(Json(json!({
        "success": true,
        "query": q,
        "count": prices.len(),
        "data": prices,
    })))
}

/// GET /api/market-prices/trends/{commodity}?days=
async fn trends(
    State(state): State<AppState>,
    Path(commodity): Path<String>,
    params: Result<Query<TrendParams>, QueryRejection>,
) -> Result<Json<Value>, HandlerError> {
    const SUMMARY: &str = "Failed to fetch price trends";
    let Query(p) = params.summarize(SUMMARY)?;
    let days = positive_param("days", p.days.as_deref(), state.defaults.trend_days)
        .summarize(SUMMARY)?;
    let query = PriceQuery::latest(
        &or_default(p.state, &state.defaults.state),
        &or_default(p.district, &state.defaults.district),
        TREND_LIMIT,
    )
    .with_commodity(&commodity);

    let now = state.clock.now();
    let raw = state.prices.fetch_records(&query).await.summarize(SUMMARY)?;
    let prices = normalize_records(&raw, now);
    let averages = daily_averages(&prices, days, now);

    Ok(Json(json!({
        "success": true,
        "commodity": commodity,
        "days": days,
        "data": averages,
    })))
}

/// GET /api/market-prices/states
async fn states(State(state): State<AppState>) -> Result<Json<Value>, HandlerError> {
    let raw = state
        .prices
        .fetch_records(&PriceQuery::field("state", GEO_LIMIT))
        .await
        .summarize("Failed to fetch states")?;
    let states = geo::states(&raw);
    Ok(Json(json!({
        "success": true,
        "count": states.len(),
        "data": states,
    })))
}

/// GET /api/market-prices/districts/{state}
async fn districts(
    State(app): State<AppState>,
    Path(state): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let raw = app
        .prices
        .fetch_records(&PriceQuery::field("district", GEO_LIMIT).in_state(&state))
        .await
        .summarize("Failed to fetch districts")?;
    let districts = geo::districts(&raw);
    Ok(Json(json!({
        "success": true,
        "state": state,
        "count": districts.len(),
        "data": districts,
    })))
}
