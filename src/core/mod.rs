//! Core types shared by the registry, the session loop and the HTTP surface

pub mod connection;
pub mod error;

pub use connection::{ConnectionHandle, ConnectionId, Frame};
pub use error::{RelayError, RelayResult};
