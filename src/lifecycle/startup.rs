//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Start the optional metrics endpoint
//! - Bind the listener and run the server until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use thiserror::Error;

use crate::config::{validate_config, ConfigError, ProxyConfig};
use crate::http::ProxyServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;

/// Fatal error before or while serving.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Listener(#[from] ListenerError),

    #[error("failed to start metrics endpoint: {0}")]
    Metrics(String),
}

/// Run the proxy until SIGINT/SIGTERM, then drain and return.
pub async fn launch(config: ProxyConfig) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();
    let _signal_task = shutdown.trigger_on(signals::shutdown_signal());
    serve(config, shutdown).await
}

/// Run the proxy until `shutdown` is triggered.
pub async fn serve(config: ProxyConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    // Subscribe before any await so an early trigger is not missed.
    let shutdown_rx = shutdown.subscribe();
    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        backlog = config.listener.backlog,
        buffer_size = config.proxy.buffer_size,
        connect_timeout_secs = ?config.timeouts.connect_secs,
        read_timeout_secs = ?config.timeouts.read_secs,
        write_timeout_secs = ?config.timeouts.write_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .map_err(|e| StartupError::Metrics(format!("{}", e)))?;
        metrics::init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
    }

    let listener = Listener::bind(&config.listener).await?;
    let server = ProxyServer::new(&config);
    server.run(listener, shutdown_rx).await?;
    Ok(())
}
