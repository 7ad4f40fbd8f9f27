//! Connection identity and outbound handles
//!
//! A [`ConnectionHandle`] is the registry's view of one client: an explicit id
//! plus the sending half of an unbounded channel. The receiving half is drained
//! by the session's write pump, which owns the socket's write side. Sending
//! never awaits the socket, so a slow or dead peer cannot stall a fan-out; once
//! the pump exits the channel closes and every further send fails immediately.

use super::error::{RelayError, RelayResult};
use axum::extract::ws::Utf8Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use tokio::sync::mpsc;

/// An encoded text frame ready to be written to a socket
///
/// Cloning is a reference-count bump, so one encoded broadcast is shared by
/// every recipient.
pub type Frame = Utf8Bytes;

/// Opaque, registry-assigned connection identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Build an id from its raw value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Outbound side of a single client connection
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<Frame>,
    connected_at: DateTime<Utc>,
}

impl ConnectionHandle {
    /// Create a handle and the receiver its write pump should drain
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Self {
            id,
            tx,
            connected_at: Utc::now(),
        };
        (handle, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Queue a frame for this connection
    ///
    /// Fails with [`RelayError::ConnectionClosed`] once the write pump is gone.
    pub fn send(&self, frame: Frame) -> RelayResult<()> {
        self.tx
            .send(frame)
            .map_err(|_| RelayError::ConnectionClosed(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::from_raw(3).to_string(), "conn-3");
        assert_eq!(ConnectionId::from_raw(3).as_u64(), 3);
    }

    #[test]
    fn test_send_reaches_receiver() {
        let (handle, mut rx) = ConnectionHandle::new(ConnectionId::from_raw(1));
        handle.send(Frame::from("hello")).unwrap();
        assert_eq!(rx.try_recv().unwrap().as_str(), "hello");
    }

    #[test]
    fn test_send_fails_after_receiver_dropped() {
        let (handle, rx) = ConnectionHandle::new(ConnectionId::from_raw(9));
        drop(rx);

        match handle.send(Frame::from("lost")) {
            Err(RelayError::ConnectionClosed(id)) => assert_eq!(id.as_u64(), 9),
            other => panic!("Expected ConnectionClosed, got {:?}", other),
        }
    }
}
