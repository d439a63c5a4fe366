// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod metrics;
pub mod prices;
pub mod schemes;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::GatewayConfig;

use axum::Router;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a tracing subscriber: `RUST_LOG` filter (default
/// `farmer_app_api=info`), compact output or JSON with `LOG_FORMAT=json`.
///
/// Uses `try_init`, so it is a no-op when the deployment runtime (or a test)
/// already installed a subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("farmer_app_api=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Build the full application router from configuration found in the
/// environment (see `GatewayConfig::load`).
pub async fn app() -> anyhow::Result<Router> {
    let cfg = GatewayConfig::load()?;
    info!(
        resource = %cfg.upstream.resource_url(),
        default_state = %cfg.defaults.state,
        default_district = %cfg.defaults.district,
        "gateway config loaded"
    );
    Ok(create_router(AppState::from_config(&cfg)))
}
