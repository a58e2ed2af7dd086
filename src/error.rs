//! Errors raised inside one request cycle.
//!
//! None of these escape a connection task. The supervisor turns every one of
//! them into a close of the client connection.

use std::io;
use thiserror::Error;

/// Failure of a single request cycle.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The client closed its side before sending a request.
    #[error("client closed the connection")]
    ClientDisconnected,

    #[error("malformed request line: {0}")]
    MalformedRequestLine(String),

    #[error("malformed header line: {0}")]
    MalformedHeader(String),

    #[error("request head is not valid UTF-8")]
    InvalidEncoding,

    #[error("request has no Host header")]
    MissingHostHeader,

    #[error("invalid Host header: {0}")]
    InvalidHostHeader(String),

    #[error("origin {target} unreachable: {source}")]
    OriginUnreachable {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Writing the request to, or reading the response from, the origin failed.
    #[error("origin I/O failed: {0}")]
    OriginIo(#[source] io::Error),

    #[error("reading from client failed: {0}")]
    ClientReadFailed(#[source] io::Error),

    #[error("writing to client failed: {0}")]
    ClientWriteFailed(#[source] io::Error),

    #[error("closing socket failed: {0}")]
    SocketCloseFailed(#[source] io::Error),

    #[error("{0} timed out")]
    Timeout(&'static str),
}

impl ProxyError {
    /// Stable short name, used as a log field and metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::ClientDisconnected => "client_disconnected",
            ProxyError::MalformedRequestLine(_) => "malformed_request_line",
            ProxyError::MalformedHeader(_) => "malformed_header",
            ProxyError::InvalidEncoding => "invalid_encoding",
            ProxyError::MissingHostHeader => "missing_host_header",
            ProxyError::InvalidHostHeader(_) => "invalid_host_header",
            ProxyError::OriginUnreachable { .. } => "origin_unreachable",
            ProxyError::OriginIo(_) => "origin_io",
            ProxyError::ClientReadFailed(_) => "client_read_failed",
            ProxyError::ClientWriteFailed(_) => "client_write_failed",
            ProxyError::SocketCloseFailed(_) => "socket_close_failed",
            ProxyError::Timeout(_) => "timeout",
        }
    }

    /// True for the normal end of a connection.
    pub fn is_client_disconnect(&self) -> bool {
        matches!(self, ProxyError::ClientDisconnected)
    }
}
