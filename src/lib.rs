//! Forwarding HTTP/1.x Proxy Library
//!
//! Accepts client connections, parses the request head, forwards it to the
//! origin named by the `Host` header and streams the response back, with an
//! optional keep-alive loop per client connection.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod resilience;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::{ParsedRequest, ProxyServer};
pub use lifecycle::Shutdown;
