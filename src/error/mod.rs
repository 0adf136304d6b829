// Error types for the quotagate gateway
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Rate limit exceeded for {identifier}")]
    QuotaExceeded { identifier: String },

    #[error("Upstream provider error: {message}")]
    Upstream {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Timed out waiting for quota lock: {0}")]
    LockTimeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Builds an upstream failure that carries only a message and an optional HTTP status.
    pub fn upstream(message: impl Into<String>, status: Option<u16>) -> Self {
        GatewayError::Upstream {
            message: message.into(),
            status,
            source: None,
        }
    }

    /// Wraps any error raised while talking to a provider as `Upstream`.
    ///
    /// Errors that already are `Upstream` pass through untouched so the
    /// original status and cause chain survive.
    pub fn into_upstream(self) -> Self {
        match self {
            upstream @ GatewayError::Upstream { .. } => upstream,
            GatewayError::Http(e) => GatewayError::Upstream {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
                source: Some(Box::new(e)),
            },
            other => GatewayError::Upstream {
                message: other.to_string(),
                status: None,
                source: Some(Box::new(other)),
            },
        }
    }

    /// HTTP status and error type string used in the JSON error body.
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            GatewayError::QuotaExceeded { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limit_error")
            }
            GatewayError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "api_error"),
            GatewayError::InvalidRequest(_) | GatewayError::Json(_) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error")
            }
            GatewayError::Config(_) | GatewayError::ConfigParsing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error")
            }
            GatewayError::LockTimeout(_) => (StatusCode::SERVICE_UNAVAILABLE, "overloaded_error"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "api_error"),
        }
    }
}

// Convert GatewayError to HTTP responses for Axum
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.classify();

        let body = json!({
            "type": "error",
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
