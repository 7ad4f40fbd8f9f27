//! ServerBuilder for fluent API to build the relay server

use super::exposure::{RelayExposure, RestExposure};
use super::exposure::websocket::ConnectionRegistry;
use crate::config::RelayConfig;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builder for the relay HTTP + WebSocket server
///
/// # Example
///
/// ```ignore
/// ServerBuilder::new()
///     .with_config(RelayConfig::load(None)?)
///     .serve()
///     .await?;
/// ```
pub struct ServerBuilder {
    config: RelayConfig,
    registry: Arc<ConnectionRegistry>,
    custom_routes: Vec<Router>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    /// Create a new ServerBuilder with default config and a fresh registry
    pub fn new() -> Self {
        Self {
            config: RelayConfig::default(),
            registry: Arc::new(ConnectionRegistry::new()),
            custom_routes: Vec::new(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing registry instead of creating one
    pub fn with_registry(mut self, registry: Arc<ConnectionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// The registry the built router will use
    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        self.registry.clone()
    }

    /// Build the complete router
    pub fn build(self) -> Result<Router> {
        let mut app = RestExposure::build_router(self.registry.clone())
            .merge(RelayExposure::build_router(self.registry.clone()));

        for custom_router in self.custom_routes {
            app = app.merge(custom_router);
        }

        if self.config.cors {
            app = app.layer(CorsLayer::permissive());
        }

        Ok(app.layer(TraceLayer::new_for_http()))
    }

    /// Bind the configured address and serve until Ctrl+C or SIGTERM
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.socket_addr();
        let app = self.build()?;
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("🚀 Relay listening on http://{}", addr);
        tracing::info!("📡 WebSocket endpoint: ws://{}{}", addr, RelayExposure::PATH);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
