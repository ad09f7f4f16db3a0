//! # Noema HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /link-types` - Registered link types
//! - `POST /nodes` - Create a node
//! - `GET /nodes/{id}` - Node data and links
//! - `POST /link` - Link two nodes
//! - `POST /unlink` - Unlink two nodes
//! - `POST /search` - Match a subgraph pattern
//!
//! ## Configuration (Environment Variables)
//!
//! - `NOEMA_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

pub use handlers::{
    create_node_handler, get_node_handler, health_handler, link_handler, link_types_handler,
    search_handler, unlink_handler,
};
pub use types::{
    AckResponse, CreateNodeRequest, CreateNodeResponse, HealthResponse, LinkRequest, LinkTypeJson,
    LinkTypesResponse, NodeResponse, SearchRequest, SearchResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use noema_core::{GraphStore, NoemaError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the graph store.
///
/// Every handler takes the write lock except `link-types`: reads fault
/// nodes into the store's cache.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<GraphStore>>,
}

impl AppState {
    #[must_use]
    pub fn new(store: GraphStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from `NOEMA_CORS_ORIGINS`.
///
/// - `*`: allows all origins
/// - unset or no valid entries: localhost only
/// - otherwise: the listed origins
fn build_cors_layer() -> CorsLayer {
    match std::env::var("NOEMA_CORS_ORIGINS").ok().as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (NOEMA_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => Some(hv),
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins in NOEMA_CORS_ORIGINS, using localhost");
                build_localhost_cors()
            } else {
                tracing::info!("CORS: Allowing {} configured origin(s)", allowed.len());
                cors_for(allowed)
            }
        }
        None => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();
    cors_for(origins)
}

fn cors_for(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/link-types", get(handlers::link_types_handler))
        .route("/nodes", post(handlers::create_node_handler))
        .route("/nodes/{id}", get(handlers::get_node_handler))
        .route("/link", post(handlers::link_handler))
        .route("/unlink", post(handlers::unlink_handler))
        .route("/search", post(handlers::search_handler))
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and flush the store on shutdown.
pub async fn run_server(addr: &str, store: GraphStore) -> Result<(), NoemaError> {
    let state = AppState::new(store);
    let router = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Noema HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, flushing store");
    state.store.write().await.flush()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
