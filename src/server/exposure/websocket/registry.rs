//! Connection registry for WebSocket clients
//!
//! The `ConnectionRegistry` is the single source of truth for who is
//! connected, and the only component that fans messages out to them.
//!
//! # Architecture
//!
//! ```text
//! Session ──register/unregister──▶ RwLock<HashMap<ConnectionId, ConnectionHandle>>
//!                                            │
//! broadcast(msg) ── encode once ── snapshot (read lock)
//!                                            │
//!                                  for each handle: send
//!                                            │
//!                         failed? ──▶ remove under write lock
//! ```
//!
//! Sends are channel pushes, so no lock is held while a socket is written to
//! and a dead recipient fails immediately instead of stalling the fan-out.

use super::protocol::{self, ServerMessage};
use crate::core::{ConnectionHandle, ConnectionId, Frame, RelayError, RelayResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};

/// Outcome of a single broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients the frame was queued for
    pub delivered: usize,
    /// Recipients whose send failed; they are no longer registered
    pub dropped: Vec<ConnectionId>,
}

/// Manages all live WebSocket connections
///
/// Constructed once and shared behind an `Arc` by the HTTP layer and every
/// session task. Independent instances do not share state.
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Allocate a fresh handle for a connection that is about to register
    ///
    /// Ids are monotonically increasing and never reused by this registry.
    pub fn open(&self) -> (ConnectionHandle, mpsc::UnboundedReceiver<Frame>) {
        let id = ConnectionId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed));
        ConnectionHandle::new(id)
    }

    /// Add a connection and greet it
    ///
    /// The `connection` envelope carrying the post-registration count is
    /// queued before the handle becomes visible to broadcasts, so it is
    /// always the first frame the client sees. If the welcome cannot be
    /// queued the handle is not added.
    pub async fn register(&self, handle: ConnectionHandle) -> RelayResult<usize> {
        let mut connections = self.connections.write().await;
        let id = handle.id();

        if connections.contains_key(&id) {
            return Err(RelayError::DuplicateConnection(id));
        }

        let count = connections.len() + 1;
        let welcome = protocol::encode(&ServerMessage::connection(count))?;
        handle.send(Frame::from(welcome))?;
        connections.insert(id, handle);

        tracing::info!(connection_id = %id, connections = count, "Client connected");

        Ok(count)
    }

    /// Remove a connection
    ///
    /// Returns `true` if it was registered. Removing an absent id is a no-op.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        let removed = connections.remove(&id);

        if let Some(handle) = &removed {
            let session_secs = (chrono::Utc::now() - handle.connected_at()).num_seconds();
            tracing::info!(
                connection_id = %id,
                connections = connections.len(),
                session_secs,
                "Client disconnected"
            );
        }

        removed.is_some()
    }

    /// Send a message to exactly one connection
    ///
    /// Failures are reported to the caller; the connection stays registered
    /// because its own session owns disconnect detection.
    pub async fn send_one(&self, id: ConnectionId, message: &ServerMessage) -> RelayResult<()> {
        let frame = Frame::from(protocol::encode(message)?);
        let connections = self.connections.read().await;
        let handle = connections
            .get(&id)
            .ok_or(RelayError::UnknownConnection(id))?;
        handle.send(frame)
    }

    /// Deliver a message to every registered connection
    ///
    /// Never fails. A recipient whose send fails is removed and the fan-out
    /// continues with the rest. Connections registered while a broadcast is in
    /// flight may or may not receive it.
    pub async fn broadcast(&self, message: &ServerMessage) -> BroadcastReport {
        let frame = match protocol::encode(message) {
            Ok(text) => Frame::from(text),
            Err(e) => {
                tracing::error!(error = %e, kind = message.kind(), "Failed to encode broadcast");
                return BroadcastReport::default();
            }
        };

        let snapshot: Vec<ConnectionHandle> =
            self.connections.read().await.values().cloned().collect();

        let mut report = BroadcastReport::default();
        for handle in &snapshot {
            match handle.send(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        connection_id = %handle.id(),
                        code = e.error_code(),
                        error = %e,
                        "Dropping connection after failed broadcast send"
                    );
                    report.dropped.push(handle.id());
                }
            }
        }

        if !report.dropped.is_empty() {
            let mut connections = self.connections.write().await;
            for id in &report.dropped {
                connections.remove(id);
            }
        }

        tracing::debug!(
            kind = message.kind(),
            delivered = report.delivered,
            dropped = report.dropped.len(),
            "Broadcast complete"
        );

        report
    }

    /// Number of live connections
    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Whether `id` is currently registered
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.connections.read().await.contains_key(&id)
    }
}
