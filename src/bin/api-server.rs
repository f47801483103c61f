//! Fusetrix API Server
//!
//! HTTP API exposing signal fusion, the tool-call surface, health and metrics.
//! Stateless apart from the in-memory market data it is seeded with.

use dotenvy::dotenv;
use fusetrix::config::{get_environment, ServerConfig};
use fusetrix::core::http::start_server;
use fusetrix::logging;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();

    let config = ServerConfig::from_env();
    let port = config.port;

    info!("Starting Fusetrix API Server");
    info!(environment = %get_environment(), "Environment");
    info!(port = port, "HTTP Server: http://0.0.0.0:{}", port);
    info!(
        history_limit = config.history_limit,
        request_timeout_ms = config.request_timeout_ms,
        backtest_history_limit = config.backtest_history_limit,
        engine_config = ?config.engine_config_path,
        market_data = ?config.market_data_path,
        "Configuration"
    );

    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(config).await {
            error!(error = %e, "HTTP server error");
        }
    });

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    Ok(())
}
