// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{chat_handler, health_handler, metrics_handler};
use super::middleware::{request_id_layers, trace_layer};
use crate::config::AppConfig;
use crate::gateway::GatewayMiddleware;
use axum::{routing::{get, post}, Router};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gateway: Arc<GatewayMiddleware>,
}

pub fn create_router(config: AppConfig, gateway: GatewayMiddleware) -> Router {
    let state = AppState {
        config: Arc::new(config),
        gateway: Arc::new(gateway),
    };

    let (set_request_id, propagate_request_id) = request_id_layers();

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/v1/chat", post(chat_handler))
        // Chat payloads are text only
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024))
        .layer(trace_layer())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state)
}
