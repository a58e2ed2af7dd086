//! Method and version policy.
//!
//! A rejected request is not an error; the supervisor closes the connection
//! without contacting any origin.

/// Methods the proxy forwards. CONNECT is deliberately absent.
pub const ALLOWED_METHODS: [&str; 6] = ["GET", "POST", "HEAD", "PUT", "DELETE", "OPTIONS"];

/// Protocol versions the proxy forwards.
pub const ALLOWED_VERSIONS: [&str; 2] = ["HTTP/1.1", "HTTP/1.0"];

/// Whether a request with this method and version may be forwarded.
/// Comparison is exact and case-sensitive.
pub fn is_allowed(method: &str, version: &str) -> bool {
    ALLOWED_METHODS.contains(&method) && ALLOWED_VERSIONS.contains(&version)
}
