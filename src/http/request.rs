//! Request head parsing and re-serialization.
//!
//! # Responsibilities
//! - Split the raw head on CRLF
//! - Parse the request line into method, path and version
//! - Parse `Name: Value` header lines up to the first empty line
//! - Serialize the parsed request back to wire form for the origin
//!
//! # Design Decisions
//! - Only the head is decoded as text; anything after the blank line is ignored
//! - Parse failures are fatal for the connection, no partial retry
//! - The request body is never forwarded

use crate::error::ProxyError;
use crate::http::headers::Headers;

/// Line delimiter and, doubled, the head terminator.
pub const CRLF: &str = "\r\n";

/// Marks the end of the header block.
pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

const HEADER_SEPARATOR: &str = ": ";

/// A parsed HTTP/1.x request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    method: String,
    path: String,
    version: String,
    headers: Headers,
}

impl ParsedRequest {
    /// Parse a request head from raw bytes.
    ///
    /// Bytes after the first blank line are not part of the head and are not
    /// decoded.
    pub fn parse(raw: &[u8]) -> Result<Self, ProxyError> {
        let head = match find_head_end(raw) {
            Some(end) => &raw[..end],
            None => raw,
        };
        let text = std::str::from_utf8(head).map_err(|_| ProxyError::InvalidEncoding)?;
        Self::parse_str(text)
    }

    /// Parse a request head from text.
    pub fn parse_str(text: &str) -> Result<Self, ProxyError> {
        let mut lines = text.split(CRLF);

        let request_line = lines.next().unwrap_or_default();
        let fields: Vec<&str> = request_line.split_whitespace().collect();
        let [method, path, version] = fields.as_slice() else {
            return Err(ProxyError::MalformedRequestLine(format!(
                "expected 3 fields, found {} in {:?}",
                fields.len(),
                request_line
            )));
        };

        let mut headers = Headers::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(HEADER_SEPARATOR)
                .ok_or_else(|| ProxyError::MalformedHeader(format!("no ': ' in {:?}", line)))?;
            if name.is_empty() {
                return Err(ProxyError::MalformedHeader(format!("empty name in {:?}", line)));
            }
            headers.insert(name, value);
        }

        Ok(Self {
            method: method.to_string(),
            path: path.to_string(),
            version: version.to_string(),
            headers,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Whether the client asked to reuse the connection.
    ///
    /// Exact, case-sensitive match on `Connection: keep-alive`.
    pub fn wants_keep_alive(&self) -> bool {
        self.headers.get("Connection") == Some("keep-alive")
    }

    /// Request line, headers and terminating blank line, ready for the origin.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = format!("{} {} {}{}", self.method, self.path, self.version, CRLF);
        for (name, value) in self.headers.iter() {
            out.push_str(name);
            out.push_str(HEADER_SEPARATOR);
            out.push_str(value);
            out.push_str(CRLF);
        }
        out.push_str(CRLF);
        out.into_bytes()
    }
}

/// Offset of the head terminator, if the buffer contains one.
pub fn find_head_end(raw: &[u8]) -> Option<usize> {
    raw.windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
}
