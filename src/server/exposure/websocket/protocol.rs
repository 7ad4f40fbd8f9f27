//! WebSocket message protocol definitions
//!
//! Defines the JSON envelopes exchanged between relay clients and the server.
//!
//! ## Client → Server Messages
//!
//! ```json
//! // Every field is optional and may hold any JSON value; "type" defaults to
//! // "message" and a missing "message" defaults to the raw frame text
//! {"type": "message", "message": "hi", "timestamp": "2024-01-01T00:00:00Z"}
//! ```
//!
//! Frames that are not a JSON object are echoed back raw with an `error`
//! field and are never broadcast.
//!
//! ## Server → Client Messages
//!
//! ```json
//! // Sent once, right after registration
//! {"type": "connection", "message": "Connected to WebSocket server", "connections": 1}
//!
//! // Private echo of the sender's own message
//! {"type": "echo", "message": "hi", "timestamp": "2024-01-01T00:00:00Z"}
//! {"type": "echo", "message": "plain text", "error": "Invalid JSON format"}
//!
//! // Fan-out to every connection, sender included
//! {"type": "broadcast", "message": "hi", "connections": 2}
//!
//! // A peer left
//! {"type": "disconnect", "message": "A client has disconnected", "connections": 1}
//! ```

use crate::core::{RelayError, RelayResult};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;

/// Text of the `connection` envelope
pub const WELCOME_TEXT: &str = "Connected to WebSocket server";

/// Text of the `disconnect` envelope
pub const DISCONNECT_TEXT: &str = "A client has disconnected";

/// `error` value attached to echoes of undecodable frames
pub const INVALID_FORMAT_TEXT: &str = "Invalid JSON format";

/// Message type assumed when the client omits `type`
pub const DEFAULT_MESSAGE_TYPE: &str = "message";

/// Message sent from client to server
///
/// Each field is `Some` when its key is present, even if the value is `null`.
/// `type` is read but not checked against an allow-list.
#[derive(Debug, Clone)]
pub struct ClientMessage {
    /// Client-declared message type
    pub kind: Option<Value>,

    /// Payload, relayed as-is
    pub message: Option<Value>,

    /// Opaque value echoed back untouched
    pub timestamp: Option<Value>,
}

impl ClientMessage {
    /// The declared type, or `"message"` when absent
    ///
    /// Non-string types are rendered as JSON.
    pub fn kind(&self) -> Cow<'_, str> {
        match &self.kind {
            None => Cow::Borrowed(DEFAULT_MESSAGE_TYPE),
            Some(Value::String(kind)) => Cow::Borrowed(kind),
            Some(other) => Cow::Owned(other.to_string()),
        }
    }

    /// The payload, falling back to the raw frame only when the key is absent
    pub fn into_content(self, raw: &str) -> Value {
        self.message
            .unwrap_or_else(|| Value::String(raw.to_owned()))
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Welcome sent to a newly registered connection
    Connection {
        message: String,
        /// Registry size including the new connection
        connections: usize,
    },
    /// Private echo to the sender
    Echo {
        message: Value,
        /// Pass-through from the client; `Some(Value::Null)` is emitted as `null`
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Fan-out of one client's message
    Broadcast { message: Value, connections: usize },
    /// Notice that a peer left
    Disconnect { message: String, connections: usize },
}

impl ServerMessage {
    pub fn connection(connections: usize) -> Self {
        ServerMessage::Connection {
            message: WELCOME_TEXT.to_string(),
            connections,
        }
    }

    /// Echo of a decoded message; an absent timestamp is echoed as `null`
    pub fn echo(message: impl Into<Value>, timestamp: Option<Value>) -> Self {
        ServerMessage::Echo {
            message: message.into(),
            timestamp: Some(timestamp.unwrap_or(Value::Null)),
            error: None,
        }
    }

    /// Echo of a frame that could not be decoded
    pub fn invalid_echo(raw: impl Into<String>) -> Self {
        ServerMessage::Echo {
            message: Value::String(raw.into()),
            timestamp: None,
            error: Some(INVALID_FORMAT_TEXT.to_string()),
        }
    }

    pub fn broadcast(message: impl Into<Value>, connections: usize) -> Self {
        ServerMessage::Broadcast {
            message: message.into(),
            connections,
        }
    }

    pub fn disconnect(connections: usize) -> Self {
        ServerMessage::Disconnect {
            message: DISCONNECT_TEXT.to_string(),
            connections,
        }
    }

    /// Wire value of the `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Connection { .. } => "connection",
            ServerMessage::Echo { .. } => "echo",
            ServerMessage::Broadcast { .. } => "broadcast",
            ServerMessage::Disconnect { .. } => "disconnect",
        }
    }
}

/// Decode one inbound text frame
///
/// Any JSON object decodes; every other input is a [`RelayError::Decode`].
pub fn decode(raw: &str) -> RelayResult<ClientMessage> {
    match serde_json::from_str::<Value>(raw).map_err(RelayError::Decode)? {
        Value::Object(mut fields) => Ok(ClientMessage {
            kind: fields.remove("type"),
            message: fields.remove("message"),
            timestamp: fields.remove("timestamp"),
        }),
        _ => Err(RelayError::Decode(serde::de::Error::custom(
            "expected a JSON object",
        ))),
    }
}

/// Encode an outbound envelope
pub fn encode(message: &ServerMessage) -> RelayResult<String> {
    serde_json::to_string(message).map_err(RelayError::Encode)
}
