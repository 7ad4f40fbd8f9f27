//! Server module for building the relay's HTTP + WebSocket server
//!
//! This module provides a `ServerBuilder` that wires:
//! - the `/ws` relay endpoint over a shared `ConnectionRegistry`
//! - the read-only `/` and `/health` routes
//! - CORS and request tracing layers

pub mod builder;
pub mod exposure;

pub use builder::ServerBuilder;
pub use exposure::{RelayExposure, RestExposure};
