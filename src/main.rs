// quotagate - Quota-enforcing, response-caching gateway for LLM chat APIs
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use quotagate::cli::Args;
use quotagate::config::AppConfig;
use quotagate::gateway::GatewayMiddleware;
use quotagate::providers;
use quotagate::server::create_router;
use quotagate::utils::logging;
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting quotagate v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Build the upstream provider
    let provider = providers::build(&config.provider)?;

    // Phase 4: Wire quota counter and response cache around it
    let gateway = GatewayMiddleware::from_config(provider, &config.cache, &config.rate_limit)?;

    // Phase 5: Build and start HTTP server
    let app = create_router(config.clone(), gateway);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 6: Run server with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
