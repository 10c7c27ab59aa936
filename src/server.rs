//! HTTP server assembly.
//!
//! Combines the resource API, the static front-end directory and the
//! cross-cutting middleware into one axum application.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{response::Redirect, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::api_routes;
use crate::config::ServerConfig;
use crate::handler::ResourceHandler;
use crate::store::ResourceStore;
use crate::validator::SchemaValidator;

/// Mock REST API server.
pub struct MockServer {
    config: ServerConfig,
    router: Router,
}

impl MockServer {
    /// Create a new server with custom configuration
    pub fn with_config(config: ServerConfig) -> Self {
        let router = Self::build_router(&config);
        Self { config, router }
    }

    fn build_router(config: &ServerConfig) -> Router {
        let handler = Arc::new(ResourceHandler::new(
            ResourceStore::new(&config.data_dir),
            SchemaValidator::new(&config.data_dir),
        ));

        let router = Router::new()
            .route("/", get(|| async { Redirect::to("/index.html") }))
            .nest("/api", api_routes(handler))
            .fallback_service(ServeDir::new(&config.static_dir))
            .layer(CorsLayer::permissive());

        if config.enable_access_logs {
            tracing::info!("access logs enabled");
            router.layer(TraceLayer::new_for_http())
        } else {
            router
        }
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind the configured address and serve until the process exits.
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid listen address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("server listening on http://{}", addr);
        tracing::info!("serving resources from {}", self.config.data_dir.display());

        axum::serve(listener, self.router).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_socket_addr() {
        let config = ServerConfig {
            listener_port: 8080,
            ..Default::default()
        };
        let server = MockServer::with_config(config);
        assert_eq!(server.socket_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_router_builds_with_access_logs() {
        let config = ServerConfig {
            enable_access_logs: true,
            ..Default::default()
        };
        let _router = MockServer::with_config(config).router();
    }
}
