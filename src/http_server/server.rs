//! # HTTP Server
//!
//! Wires the registry, the storage collaborator and the orchestrator behind
//! one axum router.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::RequestOrchestrator;
use crate::errors::StoreResult;
use crate::registry::{FileTypeRegistry, InMemoryTypeRegistry, TypeRegistry};
use crate::storage::{DocumentStore, InMemoryDocumentStore};

use super::config::HttpServerConfig;
use super::routes::{health_routes, route_not_found, space_routes};

/// HTTP server for docspace
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server with its own registry and in-memory store.
    ///
    /// The registry is persistent when `data_dir` is configured.
    pub fn with_config(config: HttpServerConfig) -> StoreResult<Self> {
        let registry: Arc<dyn TypeRegistry> = match &config.data_dir {
            Some(dir) => Arc::new(FileTypeRegistry::open(dir)?),
            None => Arc::new(InMemoryTypeRegistry::new()),
        };
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        Ok(Self::with_collaborators(config, registry, store))
    }

    /// Create a server over injected collaborators
    pub fn with_collaborators(
        config: HttpServerConfig,
        registry: Arc<dyn TypeRegistry>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let orchestrator = Arc::new(RequestOrchestrator::with_options(
            registry,
            store,
            config.orchestrator_options(),
        ));
        let router = Self::build_router(&config, orchestrator);
        Self { config, router }
    }

    /// Build the combined router
    fn build_router(config: &HttpServerConfig, orchestrator: Arc<RequestOrchestrator>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        let base_path = config.base_path.trim_end_matches('/');
        let routes = space_routes(orchestrator);
        let router = Router::new().merge(health_routes());
        let router = if base_path.is_empty() {
            router.merge(routes)
        } else {
            router.nest(base_path, routes)
        };

        router
            .fallback(route_not_found)
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server (async)
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, base_path = %self.config.base_path, "docspace HTTP server listening");

        axum::serve(listener, self.router).await?;

        Ok(())
    }
}
