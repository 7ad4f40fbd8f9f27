//! Typed errors for the relay
//!
//! Registry and codec operations return [`RelayError`] so callers can tell a
//! malformed frame apart from a dead transport. Application plumbing (config
//! loading, server startup) stays on `anyhow::Result`.

use crate::core::ConnectionId;
use thiserror::Error;

/// The main error type for relay operations
#[derive(Debug, Error)]
pub enum RelayError {
    /// Inbound text could not be decoded as a client message
    #[error("Invalid message: {0}")]
    Decode(#[source] serde_json::Error),

    /// Outbound envelope could not be serialized
    #[error("Failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),

    /// The connection's write side is gone
    #[error("Connection {0} is closed")]
    ConnectionClosed(ConnectionId),

    /// No registered connection carries this id
    #[error("Connection {0} not found")]
    UnknownConnection(ConnectionId),

    /// The id is already registered
    #[error("Connection {0} is already registered")]
    DuplicateConnection(ConnectionId),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O failure (config file, listener)
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            RelayError::Decode(_) => "DECODE_ERROR",
            RelayError::Encode(_) => "ENCODE_ERROR",
            RelayError::ConnectionClosed(_) => "CONNECTION_CLOSED",
            RelayError::UnknownConnection(_) => "UNKNOWN_CONNECTION",
            RelayError::DuplicateConnection(_) => "DUPLICATE_CONNECTION",
            RelayError::Config(_) => "CONFIG_ERROR",
            RelayError::Io(_) => "IO_ERROR",
        }
    }

    /// Whether the error means the peer can no longer be reached
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            RelayError::ConnectionClosed(_) | RelayError::UnknownConnection(_)
        )
    }
}

/// Result alias for relay operations
pub type RelayResult<T> = Result<T, RelayError>;
