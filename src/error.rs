//! Error model at the HTTP boundary.
//!
//! `ApiError` says what went wrong; `HandlerError` adds the route summary
//! shown to clients (`"Failed to fetch market prices"`, ...). Configuration
//! and upstream failures render as 500 with `{success:false, error, message}`;
//! validation and lookup failures render as 400/404 with `{success:false, error}`.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use metrics::counter;
use serde_json::json;

/// Why a call to the upstream open-data API failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Connect/TLS/timeout/body-read failure.
    Transport(String),
    /// Upstream answered with a non-2xx status.
    Status(u16),
    /// Upstream answered 2xx but the body was not the expected JSON.
    Decode(String),
}

impl UpstreamError {
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status(_) => "status",
            Self::Decode(_) => "decode",
        }
    }
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "{msg}"),
            Self::Status(code) => write!(f, "API returned status {code}"),
            Self::Decode(msg) => write!(f, "invalid upstream response: {msg}"),
        }
    }
}

impl std::error::Error for UpstreamError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Configuration(String),
    Validation(String),
    NotFound(String),
    Upstream(UpstreamError),
}

impl ApiError {
    pub fn missing_query_param(name: &str) -> Self {
        Self::Validation(format!("Query parameter \"{name}\" is required"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Configuration(_) | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Upstream(_) => "upstream",
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) | Self::Validation(msg) | Self::NotFound(msg) => {
                write!(f, "{msg}")
            }
            Self::Upstream(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        Self::Upstream(e)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::Validation(e.body_text())
    }
}

/// An `ApiError` tagged with the summary of the route that produced it.
#[derive(Debug)]
pub struct HandlerError {
    pub summary: &'static str,
    pub cause: ApiError,
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.cause.status();
        counter!("http_errors_total", "kind" => self.cause.kind()).increment(1);

        let body = match &self.cause {
            ApiError::Validation(msg) | ApiError::NotFound(msg) => json!({
                "success": false,
                "error": msg,
            }),
            ApiError::Configuration(_) | ApiError::Upstream(_) => {
                tracing::warn!(error = %self.cause, kind = self.cause.kind(), "{}", self.summary);
                json!({
                    "success": false,
                    "error": self.summary,
                    "message": self.cause.to_string(),
                })
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Attach a route summary to a failing result, in the spirit of
/// `anyhow::Context`.
pub trait Summarize<T> {
    fn summarize(self, summary: &'static str) -> Result<T, HandlerError>;
}

impl<T, E: Into<ApiError>> Summarize<T> for Result<T, E> {
    fn summarize(self, summary: &'static str) -> Result<T, HandlerError> {
        self.map_err(|e| HandlerError {
            summary,
            cause: e.into(),
        })
    }
}
