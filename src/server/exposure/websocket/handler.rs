//! WebSocket upgrade handler and session loop
//!
//! This module handles the HTTP → WebSocket upgrade and runs the per-connection
//! session. Each connection gets:
//!
//! 1. A write pump that forwards queued frames to the socket
//! 2. Registration, which queues the `connection` welcome
//! 3. A read loop applying decode → echo → broadcast to every text frame
//! 4. Cleanup on any loop exit: unregister, then a `disconnect` broadcast

use super::protocol::{self, ServerMessage};
use super::registry::ConnectionRegistry;
use crate::core::{ConnectionId, RelayResult};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::stream::StreamExt;
use std::sync::Arc;

/// WebSocket upgrade handler
///
/// This is the axum handler for GET /ws. It upgrades the HTTP connection
/// and hands the socket to the session loop.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(registry): State<Arc<ConnectionRegistry>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, registry))
}

/// Run one client session from accept to close
async fn handle_socket(socket: WebSocket, registry: Arc<ConnectionRegistry>) {
    let (handle, mut outbound) = registry.open();
    let conn_id = handle.id();

    let (mut ws_write, mut ws_read) = socket.split();

    // Write pump: dropping `outbound` on exit makes every later send fail fast
    let write_handle = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if ws_write.send(Message::Text(frame)).await.is_err() {
                tracing::debug!(connection_id = %conn_id, "WebSocket write failed, closing");
                break;
            }
        }
    });

    if let Err(e) = registry.register(handle).await {
        tracing::warn!(connection_id = %conn_id, error = %e, "Failed to register connection");
        write_handle.abort();
        return;
    }

    while let Some(result) = ws_read.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if let Err(e) = handle_text(&registry, conn_id, text.as_str()).await {
                    if e.is_disconnect() {
                        tracing::debug!(
                            connection_id = %conn_id,
                            code = e.error_code(),
                            error = %e,
                            "Echo to sender failed, ending session"
                        );
                        break;
                    }
                    tracing::warn!(
                        connection_id = %conn_id,
                        code = e.error_code(),
                        error = %e,
                        "Failed to relay message"
                    );
                }
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %conn_id, "Client sent close frame");
                break;
            }
            Ok(_) => {
                // axum answers pings itself; binary frames are not part of the protocol
            }
            Err(e) => {
                tracing::debug!(connection_id = %conn_id, error = %e, "WebSocket read error");
                break;
            }
        }
    }

    close_session(&registry, conn_id).await;
    write_handle.abort();
}

/// Apply the message protocol to one inbound text frame
///
/// A decodable frame is echoed to the sender and then broadcast to everyone,
/// sender included. An undecodable one is echoed back raw with an error and
/// goes nowhere else. Only a failed echo is reported; a disconnect error
/// means the sender's own transport is gone.
pub(crate) async fn handle_text(
    registry: &ConnectionRegistry,
    conn_id: ConnectionId,
    text: &str,
) -> RelayResult<()> {
    let incoming = match protocol::decode(text) {
        Ok(incoming) => incoming,
        Err(e) => {
            tracing::debug!(
                connection_id = %conn_id,
                code = e.error_code(),
                error = %e,
                "Undecodable frame, echoing raw"
            );
            return registry
                .send_one(conn_id, &ServerMessage::invalid_echo(text))
                .await;
        }
    };

    tracing::debug!(
        connection_id = %conn_id,
        message_type = %incoming.kind(),
        "Received message"
    );

    let timestamp = incoming.timestamp.clone();
    let content = incoming.into_content(text);

    registry
        .send_one(conn_id, &ServerMessage::echo(content.clone(), timestamp))
        .await?;

    let connections = registry.count().await;
    registry
        .broadcast(&ServerMessage::broadcast(content, connections))
        .await;

    Ok(())
}

/// Remove the connection and tell the remaining peers
pub(crate) async fn close_session(registry: &ConnectionRegistry, conn_id: ConnectionId) {
    registry.unregister(conn_id).await;

    let connections = registry.count().await;
    registry
        .broadcast(&ServerMessage::disconnect(connections))
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Frame;
    use serde_json::{Value, json};
    use tokio::sync::mpsc;

    struct Client {
        id: ConnectionId,
        rx: mpsc::UnboundedReceiver<Frame>,
    }

    impl Client {
        async fn join(registry: &ConnectionRegistry) -> Self {
            let (handle, mut rx) = registry.open();
            let id = handle.id();
            registry.register(handle).await.unwrap();
            let welcome: Value = serde_json::from_str(rx.try_recv().unwrap().as_str()).unwrap();
            assert_eq!(welcome["type"], "connection");
            Self { id, rx }
        }

        fn next(&mut self) -> Value {
            let frame = self.rx.try_recv().expect("expected a queued frame");
            serde_json::from_str(frame.as_str()).unwrap()
        }

        fn assert_idle(&mut self) {
            assert!(self.rx.try_recv().is_err(), "unexpected frame queued");
        }
    }

    #[tokio::test]
    async fn test_valid_message_is_echoed_then_broadcast() {
        let registry = ConnectionRegistry::new();
        let mut a = Client::join(&registry).await;
        let mut b = Client::join(&registry).await;

        handle_text(
            &registry,
            a.id,
            r#"{"type":"message","message":"hi","timestamp":"T"}"#,
        )
        .await
        .unwrap();

        assert_eq!(
            a.next(),
            json!({"type": "echo", "message": "hi", "timestamp": "T"})
        );
        let expected = json!({"type": "broadcast", "message": "hi", "connections": 2});
        assert_eq!(a.next(), expected);
        assert_eq!(b.next(), expected);
        a.assert_idle();
        b.assert_idle();
    }

    #[tokio::test]
    async fn test_invalid_message_echoes_only_to_sender() {
        let registry = ConnectionRegistry::new();
        let mut a = Client::join(&registry).await;
        let mut b = Client::join(&registry).await;

        handle_text(&registry, a.id, "plain text").await.unwrap();

        let echo = a.next();
        assert_eq!(echo["type"], "echo");
        assert_eq!(echo["message"], "plain text");
        assert!(!echo["error"].as_str().unwrap().is_empty());
        a.assert_idle();
        b.assert_idle();
    }

    #[tokio::test]
    async fn test_missing_fields_fall_back_to_defaults() {
        let registry = ConnectionRegistry::new();
        let mut a = Client::join(&registry).await;

        handle_text(&registry, a.id, "{}").await.unwrap();

        let echo = a.next();
        assert_eq!(echo["message"], "{}");
        assert!(echo["timestamp"].is_null());
        assert_eq!(a.next()["message"], "{}");
    }

    #[tokio::test]
    async fn test_empty_message_is_relayed() {
        let registry = ConnectionRegistry::new();
        let mut a = Client::join(&registry).await;
        let mut b = Client::join(&registry).await;

        handle_text(&registry, a.id, r#"{"type":"whatever","message":""}"#)
            .await
            .unwrap();

        assert_eq!(a.next()["message"], "");
        assert_eq!(a.next()["type"], "broadcast");
        assert_eq!(b.next()["message"], "");
    }

    #[tokio::test]
    async fn test_numeric_payload_is_relayed_as_is() {
        let registry = ConnectionRegistry::new();
        let mut a = Client::join(&registry).await;
        let mut b = Client::join(&registry).await;

        handle_text(&registry, a.id, r#"{"message": 5}"#).await.unwrap();

        assert_eq!(a.next(), json!({"type": "echo", "message": 5, "timestamp": null}));
        let expected = json!({"type": "broadcast", "message": 5, "connections": 2});
        assert_eq!(a.next(), expected);
        assert_eq!(b.next(), expected);
    }

    #[tokio::test]
    async fn test_null_payload_is_relayed_as_null() {
        let registry = ConnectionRegistry::new();
        let mut a = Client::join(&registry).await;
        let mut b = Client::join(&registry).await;

        handle_text(&registry, a.id, r#"{"message": null}"#).await.unwrap();

        let echo = a.next();
        assert!(echo["message"].is_null());
        assert!(echo.get("error").is_none());
        assert!(a.next()["message"].is_null());
        assert!(b.next()["message"].is_null());
    }

    #[tokio::test]
    async fn test_non_string_type_is_relayed() {
        let registry = ConnectionRegistry::new();
        let mut a = Client::join(&registry).await;
        let mut b = Client::join(&registry).await;

        handle_text(&registry, a.id, r#"{"type": 7, "message": "x"}"#)
            .await
            .unwrap();

        let echo = a.next();
        assert_eq!(echo["message"], "x");
        assert!(echo.get("error").is_none());
        assert_eq!(a.next()["type"], "broadcast");
        assert_eq!(b.next()["message"], "x");
    }

    #[tokio::test]
    async fn test_failed_echo_is_reported() {
        let registry = ConnectionRegistry::new();
        let a = Client::join(&registry).await;
        let mut b = Client::join(&registry).await;
        let a_id = a.id;
        drop(a);

        let result = handle_text(&registry, a_id, r#"{"message":"hi"}"#).await;
        let err = result.unwrap_err();
        assert!(err.is_disconnect());
        assert_eq!(err.error_code(), "CONNECTION_CLOSED");
        // Nothing was broadcast after the failed echo
        b.assert_idle();
    }

    #[tokio::test]
    async fn test_broadcast_drops_dead_peer_during_message() {
        let registry = ConnectionRegistry::new();
        let mut a = Client::join(&registry).await;
        let dead = Client::join(&registry).await;
        let dead_id = dead.id;
        drop(dead);

        handle_text(&registry, a.id, r#"{"message":"hi"}"#)
            .await
            .unwrap();

        assert_eq!(a.next()["type"], "echo");
        // Count was taken before the dead peer was pruned
        assert_eq!(a.next()["connections"], 2);
        assert!(!registry.contains(dead_id).await);
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_close_session_notifies_remaining_peers() {
        let registry = ConnectionRegistry::new();
        let a = Client::join(&registry).await;
        let mut b = Client::join(&registry).await;

        close_session(&registry, a.id).await;

        let notice = b.next();
        assert_eq!(notice["type"], "disconnect");
        assert_eq!(notice["message"], protocol::DISCONNECT_TEXT);
        assert_eq!(notice["connections"], 1);
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_close_session_twice_keeps_count() {
        let registry = ConnectionRegistry::new();
        let a = Client::join(&registry).await;
        let _b = Client::join(&registry).await;

        close_session(&registry, a.id).await;
        close_session(&registry, a.id).await;

        assert_eq!(registry.count().await, 1);
    }
}
