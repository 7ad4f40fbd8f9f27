//! WebSocket relay exposure
//!
//! This module provides the `/ws` route and everything behind it: the
//! connection registry, the per-connection session loop and the envelope codec.
//!
//! # Architecture
//!
//! ```text
//! Client ──ws──▶ /ws ──▶ ws_handler() ──▶ session loop
//!                                             │
//!                              decode ─▶ send_one(echo)
//!                                             │
//!                         ConnectionRegistry::broadcast ──▶ every client
//! ```
//!
//! # Protocol
//!
//! Client → Server (JSON, every field optional):
//! - `{"type": "message", "message": "hi", "timestamp": "..."}`
//!
//! Server → Client (JSON):
//! - `{"type": "connection", "message": "...", "connections": 1}`
//! - `{"type": "echo", "message": "hi", "timestamp": "..."}`
//! - `{"type": "broadcast", "message": "hi", "connections": 2}`
//! - `{"type": "disconnect", "message": "...", "connections": 1}`

mod handler;
pub mod protocol;
pub mod registry;

pub use registry::{BroadcastReport, ConnectionRegistry};

use axum::{Router, routing::get};
use std::sync::Arc;

/// WebSocket relay exposure implementation
///
/// Produces an Axum router with the `/ws` endpoint bound to a shared registry.
///
/// # Example
///
/// ```rust,ignore
/// use relay::server::{RelayExposure, RestExposure};
/// use relay::server::exposure::websocket::ConnectionRegistry;
/// use std::sync::Arc;
///
/// let registry = Arc::new(ConnectionRegistry::new());
///
/// let app = RestExposure::build_router(registry.clone())
///     .merge(RelayExposure::build_router(registry));
/// ```
pub struct RelayExposure;

impl RelayExposure {
    /// Path the upgrade endpoint is mounted on
    pub const PATH: &'static str = "/ws";

    /// Build the WebSocket router over `registry`
    pub fn build_router(registry: Arc<ConnectionRegistry>) -> Router {
        Router::new()
            .route(Self::PATH, get(handler::ws_handler))
            .with_state(registry)
    }
}
