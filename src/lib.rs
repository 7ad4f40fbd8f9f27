//! # ws-relay
//!
//! A real-time WebSocket message relay built on axum.
//!
//! ## Features
//!
//! - **Echo + Fan-out**: every message is echoed privately to its sender and
//!   broadcast to all connected clients
//! - **Join/Leave Notices**: newcomers are greeted with the live connection count,
//!   peers are told when someone leaves
//! - **Self-Healing Registry**: recipients that fail mid-broadcast are dropped
//!   without interrupting delivery to the rest
//! - **Injectable State**: the registry is an ordinary value shared by `Arc`,
//!   so tests can run independent instances side by side
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use relay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     ServerBuilder::new()
//!         .with_config(RelayConfig::load(None)?)
//!         .serve()
//!         .await
//! }
//! ```

pub mod config;
pub mod core;
pub mod server;

/// Re-exports of commonly used types
pub mod prelude {
    // === Core ===
    pub use crate::core::{ConnectionHandle, ConnectionId, Frame, RelayError, RelayResult};

    // === Protocol ===
    pub use crate::server::exposure::websocket::protocol::{ClientMessage, ServerMessage};

    // === Registry ===
    pub use crate::server::exposure::websocket::{BroadcastReport, ConnectionRegistry};

    // === Config ===
    pub use crate::config::{RelayConfig, ServerConfig};

    // === Server ===
    pub use crate::server::{RelayExposure, RestExposure, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
}
