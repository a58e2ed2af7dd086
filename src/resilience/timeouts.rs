//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap socket operations with an optional deadline
//! - Keep "no deadline configured" free of timer overhead
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - A timed-out operation closes the connection, no response is synthesized

use std::future::Future;
use std::time::Duration;

use crate::error::ProxyError;

/// Await `fut`, failing with [`ProxyError::Timeout`] if `limit` elapses first.
/// With no limit the future is awaited as is.
pub async fn deadline<F>(
    limit: Option<Duration>,
    operation: &'static str,
    fut: F,
) -> Result<F::Output, ProxyError>
where
    F: Future,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ProxyError::Timeout(operation)),
        None => Ok(fut.await),
    }
}
