//! Farmer App API binary entrypoint
//! Boots the Axum HTTP server through the Shuttle runtime.

use shuttle_axum::ShuttleAxum;
use tracing::info;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This makes DATA_GOV_API_KEY and friends visible to GatewayConfig::load.
    let _ = dotenvy::dotenv();

    farmer_app_api::init_tracing();

    let router = farmer_app_api::app().await?;
    info!("Farmer App API router ready: /api/market-prices, /api/schemes, /api/health");

    Ok(router.into())
}
