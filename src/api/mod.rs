//! HTTP surface: router, shared state, and the handful of routes that do not
//! belong to the price or scheme groups.

pub mod market;
pub mod schemes;

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::SecondsFormat;
use serde_json::{json, Value};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::clock::{Clock, SystemClock};
use crate::config::{GatewayConfig, QueryDefaults};
use crate::metrics::Metrics;
use crate::prices::{DataGovClient, PriceSource};
use crate::schemes::SchemeCatalog;

pub const SERVICE_NAME: &str = "Farmer App API Server";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct AppState {
    pub prices: Arc<dyn PriceSource>,
    pub schemes: Arc<SchemeCatalog>,
    pub clock: Arc<dyn Clock>,
    pub defaults: Arc<QueryDefaults>,
}

impl AppState {
    /// Production wiring: data.gov.in client, built-in catalog, wall clock.
    pub fn from_config(cfg: &GatewayConfig) -> Self {
        let client = DataGovClient::new(&cfg.upstream);
        if !client.has_api_key() {
            tracing::warn!("DATA_GOV_API_KEY is not set; market price routes will fail");
        }
        Self {
            prices: Arc::new(client),
            schemes: Arc::new(SchemeCatalog::default_seed()),
            clock: Arc::new(SystemClock),
            defaults: Arc::new(cfg.defaults.clone()),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .merge(market::routes())
        .merge(schemes::routes());

    if let Some(m) = Metrics::install() {
        router = router.merge(m.router::<AppState>());
    }

    router
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(panic_to_500))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "endpoints": {
            "marketPrices": "/api/market-prices",
            "schemes": "/api/schemes",
            "health": "/api/health",
        }
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Farmer App API is running",
        "timestamp": state.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

async fn route_not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Route not found",
            "path": uri.path(),
        })),
    )
}

fn panic_to_500(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(%message, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Something went wrong!",
            "message": message,
        })),
    )
        .into_response()
}
