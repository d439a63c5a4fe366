// src/config/gateway.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "GATEWAY_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/gateway.toml";

pub const ENV_API_KEY: &str = "DATA_GOV_API_KEY";
pub const ENV_BASE_URL: &str = "DATA_GOV_BASE_URL";
pub const ENV_RESOURCE_ID: &str = "DATA_GOV_RESOURCE_ID";
pub const ENV_TIMEOUT_SECS: &str = "DATA_GOV_TIMEOUT_SECS";

/// Mandi prices resource on data.gov.in ("Current daily price of various
/// commodities from various markets").
pub const DEFAULT_RESOURCE_ID: &str = "9ef84268-d588-465a-a308-a864a43d0070";
pub const DEFAULT_BASE_URL: &str = "https://api.data.gov.in/resource";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_resource_id() -> String {
    DEFAULT_RESOURCE_ID.to_string()
}
fn default_state() -> String {
    "Karnataka".to_string()
}
fn default_district() -> String {
    "Bengaluru Urban".to_string()
}
fn default_limit() -> u32 {
    50
}
fn default_trend_days() -> u32 {
    30
}

/// Where and how to reach the upstream open-data API.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_resource_id")]
    pub resource_id: String,
    /// Per-request timeout. `None` keeps the HTTP client's default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Only ever set from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            resource_id: default_resource_id(),
            timeout_secs: None,
            api_key: None,
        }
    }
}

impl UpstreamConfig {
    /// Full resource URL, e.g. `https://api.data.gov.in/resource/<id>`.
    pub fn resource_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.resource_id.trim_matches('/')
        )
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Query defaults applied when the client leaves a parameter out.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryDefaults {
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default = "default_district")]
    pub district: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_trend_days")]
    pub trend_days: u32,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            state: default_state(),
            district: default_district(),
            limit: default_limit(),
            trend_days: default_trend_days(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub defaults: QueryDefaults,
}

impl GatewayConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: GatewayConfig = toml::from_str(s).context("parsing gateway config toml")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading gateway config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load config using env var + fallbacks, then apply env overrides:
    /// 1) $GATEWAY_CONFIG_PATH (must exist)
    /// 2) config/gateway.toml
    /// 3) built-in defaults
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!(
                    "{ENV_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                ));
            }
            Self::load_from(&pb)?
        } else {
            let p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if p.exists() {
                Self::load_from(&p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    fn apply_env(&mut self) -> Result<()> {
        self.upstream.api_key = non_blank(std::env::var(ENV_API_KEY).ok());
        if let Some(url) = non_blank(std::env::var(ENV_BASE_URL).ok()) {
            self.upstream.base_url = url;
        }
        if let Some(id) = non_blank(std::env::var(ENV_RESOURCE_ID).ok()) {
            self.upstream.resource_id = id;
        }
        if let Some(raw) = non_blank(std::env::var(ENV_TIMEOUT_SECS).ok()) {
            let secs = raw
                .parse::<u64>()
                .with_context(|| format!("{ENV_TIMEOUT_SECS} must be whole seconds, got {raw:?}"))?;
            self.upstream.timeout_secs = Some(secs);
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.upstream.base_url.trim().is_empty() {
            return Err(anyhow!("upstream.base_url must not be empty"));
        }
        if self.upstream.resource_id.trim().is_empty() {
            return Err(anyhow!("upstream.resource_id must not be empty"));
        }
        if self.defaults.limit == 0 {
            return Err(anyhow!("defaults.limit must be positive"));
        }
        if self.defaults.trend_days == 0 {
            return Err(anyhow!("defaults.trend_days must be positive"));
        }
        Ok(())
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
