//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! ParsedRequest (headers)
//!     → target.rs (Host header lookup, host/port split)
//!     → Return: OriginTarget or MissingHostHeader / InvalidHostHeader
//! ```
//!
//! # Design Decisions
//! - No routing table: the client names the origin
//! - Port defaults to 80; plaintext only
//! - Deterministic: same Host value always resolves to the same target

pub mod target;

pub use target::{OriginTarget, DEFAULT_PORT};
