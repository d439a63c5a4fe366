// src/prices/client.rs
//! HTTP client for the data.gov.in resource API.

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::Client;
use serde::Deserialize;

use super::{PriceQuery, PriceSource, RawRecord};
use crate::config::gateway::ENV_API_KEY;
use crate::config::UpstreamConfig;
use crate::error::{ApiError, UpstreamError};

#[derive(Debug, Deserialize)]
struct ResourceResponse {
    #[serde(default)]
    records: Option<Vec<RawRecord>>,
}

#[derive(Clone)]
pub struct DataGovClient {
    http: Client,
    resource_url: String,
    api_key: Option<String>,
    timeout: Option<std::time::Duration>,
}

impl DataGovClient {
    pub fn new(cfg: &UpstreamConfig) -> Self {
        Self::with_client(Client::new(), cfg)
    }

    pub fn with_client(http: Client, cfg: &UpstreamConfig) -> Self {
        Self {
            http,
            resource_url: cfg.resource_url(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, ApiError> {
        self.api_key.as_deref().ok_or_else(|| {
            ApiError::Configuration(format!("{ENV_API_KEY} is not set in environment variables"))
        })
    }

    /// Query-string pairs for one request (API key excluded).
    pub fn query_pairs(query: &PriceQuery) -> Vec<(String, String)> {
        let mut params = vec![
            ("format".to_string(), "json".to_string()),
            ("limit".to_string(), query.limit.to_string()),
        ];
        for (name, value) in [
            ("state", &query.state),
            ("district", &query.district),
            ("commodity", &query.commodity),
        ] {
            if let Some(v) = value {
                params.push((format!("filters[{name}]"), v.clone()));
            }
        }
        if let Some(field) = query.fields {
            params.push(("fields".to_string(), field.to_string()));
        }
        if query.sort_by_arrival {
            params.push(("sort[0]".to_string(), "arrival_date:desc".to_string()));
        }
        params
    }

    async fn send(
        &self,
        api_key: &str,
        query: &PriceQuery,
    ) -> Result<Vec<RawRecord>, UpstreamError> {
        let mut req = self
            .http
            .get(&self.resource_url)
            .query(&[("api-key", api_key)])
            .query(&Self::query_pairs(query));
        if let Some(t) = self.timeout {
            req = req.timeout(t);
        }

        // Strip the URL from reqwest errors: it carries the API key.
        let resp = req
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url().to_string()))?;
        let parsed: ResourceResponse =
            serde_json::from_slice(&body).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        Ok(parsed.records.unwrap_or_default())
    }
}

#[async_trait]
impl PriceSource for DataGovClient {
    async fn fetch_records(&self, query: &PriceQuery) -> Result<Vec<RawRecord>, ApiError> {
        // Fail before touching the network when no key is configured.
        let api_key = self.api_key()?;

        let t0 = std::time::Instant::now();
        let res = self.send(api_key, query).await;
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("upstream_request_ms").record(ms);

        match res {
            Ok(records) => {
                tracing::debug!(
                    records = records.len(),
                    limit = query.limit,
                    commodity = ?query.commodity,
                    elapsed_ms = ms,
                    "upstream query ok"
                );
                counter!("upstream_requests_total", "outcome" => "ok").increment(1);
                Ok(records)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    outcome = e.outcome(),
                    provider = self.name(),
                    "upstream query failed"
                );
                counter!("upstream_requests_total", "outcome" => e.outcome()).increment(1);
                Err(e.into())
            }
        }
    }

    fn name(&self) -> &'static str {
        "data.gov.in"
    }
}
