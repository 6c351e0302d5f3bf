//! Response definitions
//!
//! Represents responses received from the server.

/// Validated response header
///
/// Only produced by `decode_response_header`, so `success` is always true;
/// it is kept for logging and symmetry with the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Echoed request id
    pub request_id: i64,

    /// The server processed the request
    pub success: bool,

    /// Logical result (key exists, value found, write accepted, ...)
    pub verdict: bool,
}

/// A complete response as a server would send it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Echoed request id
    pub request_id: i64,

    /// The server processed the request
    pub success: bool,

    /// Logical result
    pub verdict: bool,

    /// Value bytes, only for a GET that found something
    pub value: Option<Vec<u8>>,
}

impl Response {
    /// Create a successful response carrying only a verdict
    pub fn verdict(request_id: i64, verdict: bool) -> Self {
        Self {
            request_id,
            success: true,
            verdict,
            value: None,
        }
    }

    /// Create a successful GET response carrying a value
    pub fn found(request_id: i64, value: Vec<u8>) -> Self {
        Self {
            request_id,
            success: true,
            verdict: true,
            value: Some(value),
        }
    }

    /// Create a successful GET response for a missing key
    pub fn not_found(request_id: i64) -> Self {
        Self::verdict(request_id, false)
    }

    /// Create a response reporting that the server could not process the request
    pub fn failed(request_id: i64) -> Self {
        Self {
            request_id,
            success: false,
            verdict: false,
            value: None,
        }
    }
}
