//! Forwarding HTTP Proxy
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                FORWARD PROXY                  │
//!     Client Request     │  ┌──────────┐    ┌────────────┐               │
//!     ───────────────────┼─▶│   net    │───▶│ supervisor │ (one task per │
//!                        │  │ listener │    │   loop     │  connection)  │
//!                        │  └──────────┘    └─────┬──────┘               │
//!                        │                        ▼                      │
//!                        │           ┌────────────────────────┐          │
//!                        │           │ parse → validate →     │          │
//!                        │           │ resolve Host → dispatch│──────────┼──▶ Origin
//!                        │           └────────────────────────┘          │
//!     Client Response    │                ┌────────┐                     │
//!     ◀──────────────────┼────────────────│ relay  │◀────────────────────┼─── Origin
//!                        │                └────────┘                     │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use forward_proxy::config::{load_config, ProxyConfig};
use forward_proxy::lifecycle;
use forward_proxy::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "forward-proxy")]
#[command(about = "Forwarding HTTP/1.x proxy", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening port (overrides the configuration file).
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (overrides the configuration file).
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => ProxyConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.port = port;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!("forward-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    match lifecycle::launch(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Proxy server failed");
            ExitCode::FAILURE
        }
    }
}
