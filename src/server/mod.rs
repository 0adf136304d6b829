//! Axum-based HTTP server for the quotagate gateway.
//!
//! This module sets up the HTTP server, configures routes, and turns incoming
//! chat requests into [`GatewayMiddleware`](crate::gateway::GatewayMiddleware)
//! calls on behalf of a caller identifier.
//!
//! # Components
//!
//! - `handlers`: Implementation of individual endpoints (chat, health, metrics).
//! - `middleware`: Custom tower/axum middleware for request IDs and request spans.
//! - `routes`: The main router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::resolve_identifier;
pub use routes::{create_router, AppState};
