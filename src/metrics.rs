use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

static INSTALLED: OnceCell<Option<Metrics>> = OnceCell::new();

impl Metrics {
    /// Install the Prometheus recorder once per process.
    ///
    /// Returns `None` if another recorder was already installed (e.g. by an
    /// embedding test harness); metrics calls then go to that recorder.
    pub fn install() -> Option<Self> {
        INSTALLED
            .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
                Ok(handle) => {
                    describe();
                    Some(Self { handle })
                }
                Err(e) => {
                    tracing::warn!(error = %e, "prometheus recorder not installed");
                    None
                }
            })
            .clone()
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!(
        "upstream_requests_total",
        "Calls to the open-data API, labelled by outcome."
    );
    describe_histogram!("upstream_request_ms", "Upstream round-trip time in milliseconds.");
    describe_counter!(
        "price_records_dropped_total",
        "Upstream records discarded by the normalizer."
    );
    describe_counter!("http_errors_total", "Error responses, labelled by kind.");
}
