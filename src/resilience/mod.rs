//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Socket operation (client read, origin connect/read, any write):
//!     → timeouts.rs (enforce the configured deadline, if any)
//!     → On expiry: ProxyError::Timeout, connection closed
//! ```
//!
//! # Design Decisions
//! - Deadlines are opt-in; unset means the operation may block indefinitely
//! - No retries: a failed request cycle ends the client connection

pub mod timeouts;

pub use timeouts::deadline;
