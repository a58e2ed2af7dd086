//! Per-connection control loop.
//!
//! # Responsibilities
//! - Drive one client connection through repeated request cycles
//! - Decide keep-alive after each response
//! - Convert every failure into a close, and close the client exactly once

use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ProxyError;
use crate::http::request::{find_head_end, HEAD_TERMINATOR};
use crate::http::{validator, ParsedRequest};
use crate::net::{ConnectionId, ConnectionState};
use crate::observability::metrics;
use crate::proxy::{dispatch, relay_response, ProxySettings};
use crate::resilience::deadline;

/// Why a client connection was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client closed its side between requests.
    ClientClosed,
    /// Method or version outside the whitelist.
    Rejected,
    /// The request did not ask for `Connection: keep-alive`.
    NotKeepAlive,
    /// Writing the response to the client failed.
    ClientGone,
    /// A request cycle failed; carries the error kind.
    Failed(&'static str),
}

enum CycleOutcome {
    KeepAlive,
    Close(CloseReason),
}

/// Owns a client connection for its whole lifetime.
pub struct ConnectionSupervisor<S> {
    id: ConnectionId,
    client: S,
    settings: ProxySettings,
    state: ConnectionState,
    requests: u64,
}

impl<S> ConnectionSupervisor<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(id: ConnectionId, client: S, settings: ProxySettings) -> Self {
        Self {
            id,
            client,
            settings,
            state: ConnectionState::AwaitingRequest,
            requests: 0,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Serve request cycles until the connection has to close, then close it.
    pub async fn run(mut self) -> CloseReason {
        let reason = loop {
            match self.cycle().await {
                Ok(CycleOutcome::KeepAlive) => continue,
                Ok(CycleOutcome::Close(reason)) => break reason,
                Err(err) if err.is_client_disconnect() => break CloseReason::ClientClosed,
                Err(err) => {
                    tracing::warn!(
                        kind = err.kind(),
                        error = %err,
                        state = ?self.state,
                        "Request cycle failed, closing connection"
                    );
                    metrics::record_failure(err.kind());
                    break CloseReason::Failed(err.kind());
                }
            }
        };

        self.close().await;
        tracing::debug!(reason = ?reason, requests = self.requests, "Connection closed");
        reason
    }

    async fn cycle(&mut self) -> Result<CycleOutcome, ProxyError> {
        let raw = read_request_head(&mut self.client, &self.settings).await?;

        self.transition(ConnectionState::Parsing);
        let request = ParsedRequest::parse(&raw)?;

        self.transition(ConnectionState::Validating);
        if !validator::is_allowed(request.method(), request.version()) {
            tracing::warn!(
                method = request.method(),
                version = request.version(),
                "Request rejected, closing connection"
            );
            metrics::record_rejected();
            return Ok(CycleOutcome::Close(CloseReason::Rejected));
        }
        self.requests += 1;
        metrics::record_request(request.method());
        let keep_alive = request.wants_keep_alive();

        self.transition(ConnectionState::Dispatching);
        let started = Instant::now();
        let origin = dispatch(&request, &self.settings).await?;

        self.transition(ConnectionState::Relaying);
        let outcome = relay_response(origin, &mut self.client, &self.settings).await?;
        metrics::record_relay(outcome.bytes, started);
        tracing::debug!(
            method = request.method(),
            path = request.path(),
            bytes = outcome.bytes,
            keep_alive,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Response relayed"
        );

        self.transition(ConnectionState::DecidingKeepAlive);
        if !outcome.client_open {
            return Ok(CycleOutcome::Close(CloseReason::ClientGone));
        }
        if keep_alive {
            self.transition(ConnectionState::AwaitingRequest);
            Ok(CycleOutcome::KeepAlive)
        } else {
            Ok(CycleOutcome::Close(CloseReason::NotKeepAlive))
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::trace!(from = ?self.state, to = ?next, "State transition");
        self.state = next;
    }

    /// Best-effort shutdown; the socket itself is released when `self` drops.
    async fn close(&mut self) {
        self.transition(ConnectionState::Closed);
        if let Err(e) = self.client.shutdown().await {
            let err = ProxyError::SocketCloseFailed(e);
            tracing::warn!(kind = err.kind(), error = %err, "Closing client connection failed");
            metrics::record_failure(err.kind());
        }
    }
}

/// Read one request head, bounded by `buffer_size`.
///
/// Stops at the head terminator, a full buffer, or end of stream after some
/// bytes arrived. End of stream with nothing read is `ClientDisconnected`.
async fn read_request_head<R>(client: &mut R, settings: &ProxySettings) -> Result<Vec<u8>, ProxyError>
where
    R: AsyncRead + Unpin,
{
    let limit = settings.buffer_size;
    let mut head = vec![0u8; limit];
    let mut filled = 0;

    loop {
        let n = deadline(settings.read_timeout, "client read", client.read(&mut head[filled..]))
            .await?
            .map_err(ProxyError::ClientReadFailed)?;
        if n == 0 {
            if filled == 0 {
                return Err(ProxyError::ClientDisconnected);
            }
            break;
        }

        // The terminator may straddle two reads.
        let scan_from = filled.saturating_sub(HEAD_TERMINATOR.len() - 1);
        filled += n;
        if filled == limit || find_head_end(&head[scan_from..filled]).is_some() {
            break;
        }
    }

    head.truncate(filled);
    Ok(head)
}
