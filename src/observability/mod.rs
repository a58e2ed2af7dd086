//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Listener, supervisor, dispatcher, relay produce:
//!     → tracing events (structured fields, per-connection span)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every connection task runs in a `connection` span with its id and peer
//! - Metrics are cheap and no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
