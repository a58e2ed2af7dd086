//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, backlog, optional connection limit)
//!     → connection.rs (connection id, lifecycle tracking, state machine)
//!     → Hand off to the connection supervisor
//! ```
//!
//! # Design Decisions
//! - Backlog is explicit; the kernel queue depth is part of the config
//! - Connection cap is opt-in; by default every connection gets a task
//! - Each connection tracked so shutdown can drain in-flight work

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionState, ConnectionTracker};
pub use listener::{ConnectionPermit, Listener, ListenerError};
