//! API exposure modules
//!
//! Each exposure consumes the shared `ConnectionRegistry` and produces a Router.

pub mod rest;
pub mod websocket;

// Re-export for convenience
pub use rest::RestExposure;
pub use websocket::RelayExposure;
