//! Read-only HTTP surface
//!
//! Both routes are views over [`ConnectionRegistry::count`]:
//! - `GET /` serves the browser test client
//! - `GET /health` reports liveness and the live connection count

use super::websocket::ConnectionRegistry;
use axum::extract::State;
use axum::response::Html;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;

const INDEX_PAGE: &str = include_str!("index.html");

/// REST exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the informational router over `registry`
    pub fn build_router(registry: Arc<ConnectionRegistry>) -> Router {
        Router::new()
            .route("/", get(Self::index))
            .route("/health", get(Self::health_check))
            .with_state(registry)
    }

    /// Browser test client
    async fn index() -> Html<&'static str> {
        Html(INDEX_PAGE)
    }

    /// Health check endpoint handler
    async fn health_check(State(registry): State<Arc<ConnectionRegistry>>) -> Json<Value> {
        Json(json!({
            "status": "healthy",
            "connections": registry.count().await
        }))
    }
}
