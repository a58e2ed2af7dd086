//! Origin target resolution from the `Host` header.

use std::fmt;

use crate::error::ProxyError;
use crate::http::ParsedRequest;

/// Port used when the `Host` header names none.
pub const DEFAULT_PORT: u16 = 80;

/// Where a request is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginTarget {
    pub host: String,
    pub port: u16,
}

impl OriginTarget {
    /// Resolve the target of a parsed request.
    pub fn from_request(request: &ParsedRequest) -> Result<Self, ProxyError> {
        let host = request
            .headers()
            .get("Host")
            .ok_or(ProxyError::MissingHostHeader)?;
        Self::from_host_header(host)
    }

    /// Parse a `Host` header value: `name`, `name:port`, `[v6]` or `[v6]:port`.
    pub fn from_host_header(value: &str) -> Result<Self, ProxyError> {
        let invalid = || ProxyError::InvalidHostHeader(value.to_string());

        let (host, port) = if let Some(rest) = value.strip_prefix('[') {
            let (host, after) = rest.split_once(']').ok_or_else(invalid)?;
            match after {
                "" => (host, None),
                _ => (host, Some(after.strip_prefix(':').ok_or_else(invalid)?)),
            }
        } else {
            match value.split_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (value, None),
            }
        };

        if host.is_empty() {
            return Err(invalid());
        }
        let port = match port {
            Some(port) => port.parse::<u16>().map_err(|_| invalid())?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for OriginTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
