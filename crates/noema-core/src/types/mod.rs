//! # Core Type Definitions
//!
//! This module contains the shared types for the Noema knowledge graph:
//! - Node identity (`NodeId`, `NodeHandle`)
//! - Node payloads (`Data`, `Links`)
//! - Boundary record kinds (`Kind`)
//! - Error types (`NoemaError`)
//!
//! ## Determinism Guarantees
//!
//! Adjacency uses `BTreeMap` so neighbor enumeration, and therefore search
//! result order, is stable across runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// NODE PAYLOADS
// =============================================================================

/// Attribute map attached to a node. Compared by value, never by reference.
pub type Data = serde_json::Map<String, serde_json::Value>;

/// Adjacency of one node: edge-type name -> neighbor -> edge payload.
///
/// The edge payload is reserved for per-edge metadata and is currently
/// always empty.
pub type Links = BTreeMap<String, BTreeMap<NodeId, Data>>;

// =============================================================================
// NODE IDENTIFIERS
// =============================================================================

/// Identifier of a persisted node.
///
/// Validation happens at the store boundary, not on construction, so a
/// `NodeId` can always be built from caller input and then rejected with
/// `NoemaError::InvalidArgument`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create an identifier from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&String> for NodeId {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

impl From<&NodeId> for NodeId {
    fn from(id: &NodeId) -> Self {
        id.clone()
    }
}

// =============================================================================
// NODE HANDLE
// =============================================================================

/// Lightweight reference to a node.
///
/// A handle holds only the identifier. Data and adjacency are always
/// resolved through the `GraphStore`, which faults the node into its cache
/// on first use. Serializes as `{ "id": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeHandle {
    /// The node this handle refers to.
    pub id: NodeId,
}

impl NodeHandle {
    /// Wrap an identifier without touching any store.
    #[must_use]
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self { id: id.into() }
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.id.as_str()
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}

impl From<NodeHandle> for NodeId {
    fn from(handle: NodeHandle) -> Self {
        handle.id
    }
}

impl From<&NodeHandle> for NodeId {
    fn from(handle: &NodeHandle) -> Self {
        handle.id.clone()
    }
}

// =============================================================================
// BOUNDARY RECORD KIND
// =============================================================================

/// The two records persisted per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// The node's attribute map.
    Data,
    /// The node's adjacency.
    Links,
}

impl Kind {
    /// Name used in file names and storage keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Links => "links",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Noema system.
///
/// - Wrong-shape input is rejected before any side effect
/// - A pattern edge that does not exist in the graph is NOT an error; it
///   prunes a search branch
/// - Boundary failures propagate unmodified
#[derive(Debug, Error)]
pub enum NoemaError {
    /// A public entry point was given an argument of the wrong shape.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An edge type with this name is already registered.
    #[error("Link type already registered: {0}")]
    LinkTypeExists(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// A file I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedded database reported an error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl NoemaError {
    /// Shorthand for `InvalidArgument`.
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// True for errors caused by caller input rather than the environment.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_) | Self::LinkTypeExists(_) | Self::Deserialization(_)
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_equality_is_by_id() {
        let a = NodeHandle::new("abc");
        let b = NodeHandle::new(NodeId::new("abc"));
        assert_eq!(a, b);
        assert_ne!(a, NodeHandle::new("abd"));
    }

    #[test]
    fn handle_serializes_as_id_object() {
        let handle = NodeHandle::new("7f");
        let json = serde_json::to_string(&handle).expect("serialize");
        assert_eq!(json, r#"{"id":"7f"}"#);

        let back: NodeHandle = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, handle);
    }

    #[test]
    fn node_id_is_transparent() {
        let json = serde_json::to_string(&NodeId::new("12")).expect("serialize");
        assert_eq!(json, r#""12""#);
    }

    #[test]
    fn kind_names() {
        assert_eq!(Kind::Data.as_str(), "data");
        assert_eq!(Kind::Links.to_string(), "links");
    }

    #[test]
    fn client_errors_are_classified() {
        assert!(NoemaError::invalid("x").is_client_error());
        assert!(!NoemaError::Storage("x".to_string()).is_client_error());
    }
}
