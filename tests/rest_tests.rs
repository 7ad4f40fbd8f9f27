//! Tests for the read-only HTTP surface

use axum_test::TestServer;
use relay::prelude::*;
use serde_json::Value;
use std::sync::Arc;

fn create_test_server() -> (TestServer, Arc<ConnectionRegistry>) {
    let builder = ServerBuilder::new();
    let registry = builder.registry();
    let app = builder.build().expect("Failed to build app");
    let server = TestServer::new(app);

    (server, registry)
}

#[tokio::test]
async fn test_health_endpoint_empty() {
    let (server, _) = create_test_server();

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["connections"], 0);
}

#[tokio::test]
async fn test_health_endpoint_reflects_registry() {
    let (server, registry) = create_test_server();

    let (first, _rx1) = registry.open();
    let (second, _rx2) = registry.open();
    let first_id = first.id();
    registry.register(first).await.unwrap();
    registry.register(second).await.unwrap();

    let body: Value = server.get("/health").await.json();
    assert_eq!(body["connections"], 2);

    registry.unregister(first_id).await;

    let body: Value = server.get("/health").await.json();
    assert_eq!(body["connections"], 1);
}

#[tokio::test]
async fn test_root_serves_test_client() {
    let (server, _) = create_test_server();

    let response = server.get("/").await;
    response.assert_status_ok();

    let page = response.text();
    assert!(page.contains("<!DOCTYPE html>"));
    assert!(page.contains("/ws"));
}

#[tokio::test]
async fn test_custom_routes_are_merged() {
    use axum::routing::get;

    let custom = axum::Router::new().route("/version", get(|| async { "0.1.0" }));
    let app = ServerBuilder::new()
        .with_custom_routes(custom)
        .build()
        .expect("Failed to build app");
    let server = TestServer::new(app);

    let response = server.get("/version").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "0.1.0");
}

#[tokio::test]
async fn test_ws_route_requires_upgrade() {
    let (server, _) = create_test_server();

    let response = server.get("/ws").expect_failure().await;
    assert!(response.status_code().is_client_error());
}
