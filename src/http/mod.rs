//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, one task per connection)
//!     → request.rs (parse request line and headers, re-serialize)
//!     → validator.rs (method / version whitelist)
//!     → proxy pipeline (dispatch, relay, keep-alive)
//! ```
//!
//! HTTP/1.0 and HTTP/1.1 heads only; bodies are not interpreted.

pub mod headers;
pub mod request;
pub mod server;
pub mod validator;

pub use headers::Headers;
pub use request::ParsedRequest;
pub use server::ProxyServer;
