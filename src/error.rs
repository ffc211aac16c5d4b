// src/error.rs
// Error taxonomy for request handling and startup configuration

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Everything a detect or humanize request can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("ROUTER_API_KEY not configured")]
    UpstreamUnconfigured,

    #[error("Request timeout - please try with a shorter text")]
    UpstreamTimeout { timeout_ms: u64 },

    #[error("Router API error: {status} {status_text}")]
    UpstreamError { status: u16, status_text: String },

    #[error("Router API transport failure: {0}")]
    Transport(String),

    #[error("Upstream output did not contain a usable result: {0}")]
    MalformedUpstreamOutput(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Too many requests, please try again later.")]
    RateLimited { retry_after_secs: u64 },
}

impl ApiError {
    /// Stable code used in the `{ ok: false, error: { code, message } }` envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::RateLimited { .. } => "RATE_LIMITED",
            _ => "SERVER_ERROR",
        }
    }
}

/// Wire shape of every failure: the `{ ok, error: { code, message } }`
/// envelope, except rate limiting which answers `{ error }` plus Retry-After.
impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            Self::RateLimited { retry_after_secs } => builder
                .insert_header((header::RETRY_AFTER, (*retry_after_secs).max(1).to_string()))
                .json(json!({ "error": self.to_string() })),
            _ => builder.json(json!({
                "ok": false,
                "error": { "code": self.code(), "message": self.to_string() }
            })),
        }
    }
}

/// Invalid values found while reading configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },
}
