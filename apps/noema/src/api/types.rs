//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use noema_core::{Data, EdgeType, Links, NodeId, SubgraphDocument};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// LINK TYPES RESPONSE
// =============================================================================

/// One registered link type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkTypeJson {
    pub name: String,
    pub opposite: String,
    pub transitive: bool,
    pub undirected: bool,
    pub is_opp: bool,
}

impl From<&EdgeType> for LinkTypeJson {
    fn from(link: &EdgeType) -> Self {
        Self {
            name: link.name().to_string(),
            opposite: link.opposite_name().to_string(),
            transitive: link.is_transitive(),
            undirected: link.is_undirected(),
            is_opp: link.is_opp(),
        }
    }
}

/// Registered link types, in registration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkTypesResponse {
    pub link_types: Vec<LinkTypeJson>,
}

// =============================================================================
// NODE REQUEST/RESPONSE
// =============================================================================

/// Node creation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNodeRequest {
    #[serde(default)]
    pub data: Option<Data>,
}

/// Node creation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNodeResponse {
    pub success: bool,
    pub id: Option<NodeId>,
    pub error: Option<String>,
}

impl CreateNodeResponse {
    pub fn success(id: NodeId) -> Self {
        Self {
            success: true,
            id: Some(id),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(msg.into()),
        }
    }
}

/// A node's data and adjacency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResponse {
    pub success: bool,
    pub id: Option<NodeId>,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub links: Links,
    pub error: Option<String>,
}

impl NodeResponse {
    pub fn success(id: NodeId, data: Data, links: Links) -> Self {
        Self {
            success: true,
            id: Some(id),
            data,
            links,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            data: Data::new(),
            links: Links::new(),
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// LINK REQUEST/RESPONSE
// =============================================================================

/// Link or unlink request: `from -(link)-> to`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRequest {
    pub from: String,
    pub link: String,
    pub to: String,
}

/// Acknowledgement for mutations without a payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    pub error: Option<String>,
}

impl AckResponse {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// SEARCH REQUEST/RESPONSE
// =============================================================================

/// Search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub pattern: SubgraphDocument,
    /// Clear the pattern's resolutions (except `id` matchers) first.
    #[serde(default)]
    pub drop_ideas: bool,
}

/// Search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub count: usize,
    pub results: Vec<SubgraphDocument>,
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn success(results: Vec<SubgraphDocument>) -> Self {
        Self {
            success: true,
            count: results.len(),
            results,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            count: 0,
            results: Vec::new(),
            error: Some(msg.into()),
        }
    }
}
