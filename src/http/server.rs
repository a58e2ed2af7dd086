//! Proxy server accept loop.
//!
//! # Responsibilities
//! - Accept client connections until shutdown is signalled
//! - Spawn one independent task per connection running the supervisor
//! - Keep accepting after accept errors
//! - Drain in-flight connections before returning

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::config::ProxyConfig;
use crate::net::{ConnectionPermit, ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::proxy::{ConnectionSupervisor, ProxySettings};

/// Pause after a failed accept so a persistent error (e.g. fd exhaustion)
/// does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// The forwarding proxy server.
pub struct ProxyServer {
    settings: ProxySettings,
    drain_timeout: Option<Duration>,
    tracker: ConnectionTracker,
}

impl ProxyServer {
    /// Create a new server with the given configuration.
    pub fn new(config: &ProxyConfig) -> Self {
        Self {
            settings: ProxySettings::from_config(config),
            drain_timeout: config.lifecycle.drain_timeout_secs.map(Duration::from_secs),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Tracker of live connections, shared with every connection task.
    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Accept connections until `shutdown` fires, then wait for in-flight
    /// connections to finish.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Accept)?;
        tracing::info!(address = %addr, "Proxy server accepting connections");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => self.spawn_connection(stream, peer, permit),
                    Err(ListenerError::Closed) => return Err(ListenerError::Closed),
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        metrics::record_accept_error();
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                }
            }
        }

        drop(listener);
        let in_flight = self.tracker.active_count();
        if in_flight > 0 {
            tracing::info!(in_flight, "Waiting for connections to drain");
        }
        let remaining = self.tracker.wait_for_drain(self.drain_timeout).await;
        if remaining > 0 {
            tracing::warn!(remaining, "Drain timeout elapsed with connections still open");
        }

        tracing::info!("Proxy server stopped");
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr, permit: ConnectionPermit) {
        let guard = self.tracker.track();
        let id = guard.id();
        metrics::record_connection_accepted();
        tracing::debug!(connection_id = %id, peer_addr = %peer, "Accepted connection");

        let supervisor = ConnectionSupervisor::new(id, stream, self.settings);
        let span = tracing::info_span!("connection", id = %id, peer = %peer);
        tokio::spawn(
            async move {
                let _permit = permit;
                let _guard = guard;
                supervisor.run().await;
            }
            .instrument(span),
        );
    }
}
