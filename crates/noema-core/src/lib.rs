//! # noema-core
//!
//! The graph store and subgraph search engine for Noema.
//!
//! This crate holds a persisted knowledge graph (nodes with attribute data
//! and typed, symmetric adjacency) and a constraint-satisfaction matcher
//! that finds every way a query template ("subgraph") can be bound to
//! concrete nodes.
//!
//! ## Layers
//!
//! - `links`: append-only registry of edge types and their opposites
//! - `storage`: the load/save boundary (memory, sharded files, redb)
//! - `store`: node identity, lazy node cache, link/unlink, contexts
//! - `subgraph`: query templates, matchers and their text form
//! - `search`: the backtracking search engine
//!
//! ## Constraints
//!
//! - Synchronous, no async, no network dependencies
//! - Deterministic: adjacency is ordered, so search results are too
//! - Single logical thread of control over a `GraphStore`

// =============================================================================
// MODULES
// =============================================================================

pub mod ids;
pub mod links;
pub mod primitives;
pub mod search;
pub mod storage;
pub mod store;
pub mod subgraph;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Data, Kind, Links, NodeHandle, NodeId, NoemaError};

// =============================================================================
// RE-EXPORTS: Graph Engine
// =============================================================================

pub use links::{EdgeType, LinkRegistry};
pub use search::{Branch, Direction, Expansion, SearchEngine};
pub use storage::{Boundary, FileBoundary, MemoryBoundary, RedbBoundary, StorageBackend};
pub use store::GraphStore;
pub use subgraph::{
    EdgeDocument, EdgeId, ExactTemplate, Matcher, Subgraph, SubgraphDocument, VertexDocument,
    VertexId,
};
