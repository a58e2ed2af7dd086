//! Per-connection forwarding pipeline.
//!
//! # Data Flow
//! ```text
//! supervisor.rs  read head from client (bounded)
//!     → http::ParsedRequest::parse
//!     → http::validator::is_allowed
//!     → dispatcher.rs (resolve Host, connect, send request head)
//!     → relay.rs (origin → client until origin EOF)
//!     → keep-alive decision → next cycle or close
//! ```
//!
//! # Design Decisions
//! - One origin connection per request cycle, closed before the next cycle
//! - Any failure closes the client connection; no error response is written
//! - Request bodies are not forwarded

pub mod dispatcher;
pub mod relay;
pub mod supervisor;

use std::time::Duration;

use crate::config::ProxyConfig;

pub use dispatcher::{dispatch, send_request};
pub use relay::{relay_response, RelayOutcome};
pub use supervisor::{CloseReason, ConnectionSupervisor};

/// Settings every connection task needs, copied out of the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxySettings {
    pub buffer_size: usize,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

impl ProxySettings {
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            buffer_size: config.proxy.buffer_size,
            connect_timeout: config.timeouts.connect(),
            read_timeout: config.timeouts.read(),
            write_timeout: config.timeouts.write(),
        }
    }
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self::from_config(&ProxyConfig::default())
    }
}
