// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::config::ProviderKind;
use crate::error::GatewayError;
use crate::metrics;
use crate::models::ChatRequest;
use crate::providers::models::{anthropic, openai};
use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::{debug, error, info};

/// Header a trusted front end can set to name the caller explicitly
pub const CLIENT_ID_HEADER: &str = "x-client-id";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
    pub cache_enabled: bool,
    pub rate_limit_enabled: bool,
    pub known_models: Vec<String>,
    pub timestamp: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let known_models = match state.config.provider.kind {
        ProviderKind::OpenAi => openai::ALL,
        ProviderKind::Anthropic => anthropic::ALL,
    };

    metrics::record_request("/health", 200);

    Json(HealthResponse {
        status: "healthy".to_string(),
        provider: state.gateway.provider_name().to_string(),
        cache_enabled: state.gateway.cache_enabled(),
        rate_limit_enabled: state.gateway.quota_enabled(),
        known_models: known_models.iter().map(|m| m.to_string()).collect(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

/// Caller identity used for quota accounting: `x-client-id`, then the first
/// `x-forwarded-for` hop, then the peer address.
pub fn resolve_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    header_value(CLIENT_ID_HEADER)
        .or_else(|| {
            header_value("x-forwarded-for").and_then(|forwarded| {
                forwarded
                    .split(',')
                    .map(str::trim)
                    .find(|hop| !hop.is_empty())
                    .map(str::to_string)
            })
        })
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "anonymous".to_string())
}

/// Handler for /v1/chat
pub async fn chat_handler(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let identifier = resolve_identifier(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    let response = match serve_chat(&state, &identifier, &body).await {
        Ok(response) => response,
        Err(e) => {
            if !matches!(e, GatewayError::QuotaExceeded { .. }) {
                error!("Chat request failed: {}", e);
            }
            e.into_response()
        }
    };

    metrics::record_request("/v1/chat", response.status().as_u16());
    response
}

async fn serve_chat(
    state: &AppState,
    identifier: &str,
    body: &str,
) -> Result<Response, GatewayError> {
    let mut request: ChatRequest = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("JSON deserialization error: {}", e)))?;

    if request.messages.is_empty() {
        return Err(GatewayError::InvalidRequest("messages must not be empty".to_string()));
    }

    if request.model.trim().is_empty() {
        request.model = state.config.provider.default_model();
        debug!("No model given, using default: {}", request.model);
    }

    info!(
        "Received chat request: model={}, messages={}, fresh={}, identifier={}",
        request.model,
        request.messages.len(),
        request.fresh,
        identifier
    );

    let chat_response = state.gateway.handle(&request, identifier).await?;

    let mut response = Json(chat_response.to_json()).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(
        "x-cache",
        HeaderValue::from_static(if chat_response.from_cache { "HIT" } else { "MISS" }),
    );
    if let Some(remaining) = chat_response.tries_remaining {
        response_headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
    }

    Ok(response)
}
