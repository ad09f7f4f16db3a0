//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Client errors (bad ids, unknown link types, malformed patterns) map to
//! `400`; boundary failures map to `500`.

use super::{
    AppState,
    types::{
        AckResponse, CreateNodeRequest, CreateNodeResponse, HealthResponse, LinkRequest,
        LinkTypeJson, LinkTypesResponse, NodeResponse, SearchRequest, SearchResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use noema_core::{GraphStore, NoemaError, SearchEngine, Subgraph};

/// HTTP status for a core error.
fn status_for(error: &NoemaError) -> StatusCode {
    if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// LINK TYPES HANDLER
// =============================================================================

/// List registered link types.
pub async fn link_types_handler(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.read().await;
    let link_types = store.list_link_types().map(LinkTypeJson::from).collect();
    (StatusCode::OK, Json(LinkTypesResponse { link_types }))
}

// =============================================================================
// NODE HANDLERS
// =============================================================================

/// Create a node.
pub async fn create_node_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateNodeRequest>,
) -> impl IntoResponse {
    let mut store = state.store.write().await;
    match store.create(request.data) {
        Ok(handle) => (StatusCode::OK, Json(CreateNodeResponse::success(handle.id))),
        Err(e) => (
            status_for(&e),
            Json(CreateNodeResponse::error(format!("Create failed: {}", e))),
        ),
    }
}

/// Get a node's data and links.
pub async fn get_node_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    // Faulting a node into the cache mutates the store.
    let mut store = state.store.write().await;
    match read_node(&mut store, &id) {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => (
            status_for(&e),
            Json(NodeResponse::error(format!("Lookup failed: {}", e))),
        ),
    }
}

fn read_node(store: &mut GraphStore, id: &str) -> Result<NodeResponse, NoemaError> {
    let handle = store.load(id)?;
    let data = store.data(&handle)?;
    let links = store.links(&handle)?;
    Ok(NodeResponse::success(handle.id, data, links))
}

// =============================================================================
// LINK HANDLERS
// =============================================================================

/// Link two nodes.
pub async fn link_handler(
    State(state): State<AppState>,
    Json(request): Json<LinkRequest>,
) -> impl IntoResponse {
    let mut store = state.store.write().await;
    match change_link(&mut store, &request, true) {
        Ok(()) => (StatusCode::OK, Json(AckResponse::success())),
        Err(e) => (
            status_for(&e),
            Json(AckResponse::error(format!("Link failed: {}", e))),
        ),
    }
}

/// Unlink two nodes.
pub async fn unlink_handler(
    State(state): State<AppState>,
    Json(request): Json<LinkRequest>,
) -> impl IntoResponse {
    let mut store = state.store.write().await;
    match change_link(&mut store, &request, false) {
        Ok(()) => (StatusCode::OK, Json(AckResponse::success())),
        Err(e) => (
            status_for(&e),
            Json(AckResponse::error(format!("Unlink failed: {}", e))),
        ),
    }
}

/// Apply a link change and write both endpoints through.
fn change_link(store: &mut GraphStore, request: &LinkRequest, add: bool) -> Result<(), NoemaError> {
    let link = store.registry().require(&request.link)?.clone();
    let from = store.proxy(request.from.as_str())?;
    let to = store.proxy(request.to.as_str())?;

    if add {
        store.link(&from, &link, &to)?;
    } else {
        store.unlink(&from, &link, &to)?;
    }
    store.save(&from)?;
    store.save(&to)?;
    Ok(())
}

// =============================================================================
// SEARCH HANDLER
// =============================================================================

/// Match a subgraph pattern against the graph.
pub async fn search_handler(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> impl IntoResponse {
    let mut store = state.store.write().await;
    match execute_search(&mut store, &request) {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => (
            status_for(&e),
            Json(SearchResponse::error(format!("Search failed: {}", e))),
        ),
    }
}

fn execute_search(
    store: &mut GraphStore,
    request: &SearchRequest,
) -> Result<SearchResponse, NoemaError> {
    let mut pattern = Subgraph::from_document(&request.pattern, store.registry())?;
    if request.drop_ideas {
        pattern.clear_ideas();
    }
    let results = SearchEngine::search(store, &pattern)?;
    Ok(SearchResponse::success(
        results.iter().map(|sg| sg.to_document(false)).collect(),
    ))
}
