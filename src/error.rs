//! Error types for Riorita
//!
//! Provides a unified error type for all client operations.

use thiserror::Error;

/// Result type alias using RioritaError
pub type Result<T> = std::result::Result<T, RioritaError>;

/// Unified error type for Riorita client operations
#[derive(Debug, Error)]
pub enum RioritaError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Can't connect to {0}")]
    CannotConnect(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Operation didn't return with success [requestId={request_id}]")]
    NotSuccessful { request_id: i64 },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification the executor logs before retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Socket connect/read/write failure or premature end of stream
    Transport,

    /// Server answered, but the answer could not be accepted
    Protocol,

    /// Caller-side mistake; never produced by the wire
    Usage,
}

impl RioritaError {
    /// Classify this error
    pub fn class(&self) -> ErrorClass {
        match self {
            RioritaError::Io(_) | RioritaError::CannotConnect(_) => ErrorClass::Transport,
            RioritaError::Protocol(_)
            | RioritaError::MalformedResponse(_)
            | RioritaError::NotSuccessful { .. } => ErrorClass::Protocol,
            RioritaError::Config(_) => ErrorClass::Usage,
        }
    }

    /// True if the error came from the socket rather than the response contents
    pub fn is_transport(&self) -> bool {
        self.class() == ErrorClass::Transport
    }

    /// True if the server sent something the codec rejected
    pub fn is_protocol(&self) -> bool {
        self.class() == ErrorClass::Protocol
    }
}
