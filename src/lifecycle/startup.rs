//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Bind the listener and run the server until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::analytics::SinkError;
use crate::config::{load_config, ConfigError};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::observability::{logging, metrics};
use crate::upstream::UpstreamError;

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build upstream client: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("failed to build analytics sink: {0}")]
    Sink(#[from] SinkError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Run the edge router until SIGINT/SIGTERM.
pub async fn run(config_path: Option<&Path>) -> Result<(), StartupError> {
    let config = load_config(config_path)?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "pdf-edge-router starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        load_service = %config.upstreams.load_service_url,
        query_service = %config.upstreams.query_service_url,
        analytics = config.analytics.is_active(),
        delivery = ?config.analytics.delivery,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Address was validated with the rest of the config.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let server = HttpServer::new(config)?;

    let address = server.config().listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    let stats = server
        .run(listener, server_shutdown)
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!(
        written = stats.written,
        failed = stats.failed,
        abandoned = stats.abandoned,
        "Shutdown complete"
    );
    Ok(())
}
