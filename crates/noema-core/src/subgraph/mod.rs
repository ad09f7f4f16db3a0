//! # Subgraph
//!
//! Query templates for the search engine.
//!
//! A `Subgraph` is a small pattern graph: an ordered list of vertices, each
//! carrying a `Matcher` and an optional resolution ("idea"), and an ordered
//! list of directed edges typed by registered `EdgeType`s. Search binds the
//! unresolved vertices to concrete nodes.
//!
//! A subgraph is a plain value. `Clone` produces a fully independent copy
//! (vertices, edges and resolutions), which is how the search engine
//! branches without disturbing siblings or the caller's original.

mod format;
mod matcher;

pub use format::{EdgeDocument, SubgraphDocument, VertexDocument};
pub use matcher::{ExactTemplate, Matcher};

use crate::links::{EdgeType, LinkRegistry};
use crate::primitives::MATCH_REF_OPTION;
use crate::{Data, NodeHandle, NoemaError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Position of a vertex within its subgraph.
///
/// Assigned sequentially from 0. Serializes as a decimal string (`"0"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(usize);

impl VertexId {
    /// Create a vertex id from its position.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The position of the vertex.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for VertexId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for VertexId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<usize>()
            .map(Self)
            .map_err(|_| serde::de::Error::custom(format!("invalid vertex id '{}'", raw)))
    }
}

/// Position of an edge within its subgraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(usize);

impl EdgeId {
    /// Create an edge id from its position.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The position of the edge.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// VERTICES AND EDGES
// =============================================================================

/// A pattern vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    matcher: Matcher,
    options: Data,
    idea: Option<NodeHandle>,
}

impl Vertex {
    /// The acceptance predicate of this vertex.
    #[must_use]
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Free-form vertex options.
    #[must_use]
    pub fn options(&self) -> &Data {
        &self.options
    }

    /// The node this vertex is bound to, if any.
    #[must_use]
    pub fn idea(&self) -> Option<&NodeHandle> {
        self.idea.as_ref()
    }

    /// Check if the vertex is bound.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.idea.is_some()
    }
}

/// A directed pattern edge.
///
/// Edges are directed exactly as added. Symmetry is a property of the
/// underlying graph, not of the pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    src: VertexId,
    link: EdgeType,
    dst: VertexId,
    pref: i64,
}

impl Edge {
    /// Source vertex.
    #[must_use]
    pub fn src(&self) -> VertexId {
        self.src
    }

    /// Edge type.
    #[must_use]
    pub fn link(&self) -> &EdgeType {
        &self.link
    }

    /// Destination vertex.
    #[must_use]
    pub fn dst(&self) -> VertexId {
        self.dst
    }

    /// Search-ordering weight; higher is expanded first.
    #[must_use]
    pub fn pref(&self) -> i64 {
        self.pref
    }
}

// =============================================================================
// SUBGRAPH
// =============================================================================

/// A query template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subgraph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
}

impl Subgraph {
    /// Create an empty subgraph. An empty subgraph is already concrete.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vertex with no options.
    ///
    /// An `Id` matcher resolves the vertex immediately.
    pub fn add_vertex(&mut self, matcher: Matcher) -> VertexId {
        self.add_vertex_with(matcher, Data::new())
    }

    /// Append a vertex with free-form options.
    ///
    /// For `Exact` matchers the `matchRef` option is derived from the
    /// template and any caller-supplied value is dropped.
    pub fn add_vertex_with(&mut self, matcher: Matcher, mut options: Data) -> VertexId {
        if matches!(matcher, Matcher::Exact(_)) {
            options.remove(MATCH_REF_OPTION);
        }
        let idea = match &matcher {
            Matcher::Id(handle) => Some(handle.clone()),
            _ => None,
        };
        let id = VertexId(self.vertices.len());
        self.vertices.push(Vertex {
            matcher,
            options,
            idea,
        });
        id
    }

    /// Append a directed edge with preference 0.
    pub fn add_edge(
        &mut self,
        src: VertexId,
        link: &EdgeType,
        dst: VertexId,
    ) -> Result<EdgeId, NoemaError> {
        self.add_edge_with_pref(src, link, dst, 0)
    }

    /// Append a directed edge with an explicit preference.
    ///
    /// Either endpoint may still be unresolved.
    pub fn add_edge_with_pref(
        &mut self,
        src: VertexId,
        link: &EdgeType,
        dst: VertexId,
        pref: i64,
    ) -> Result<EdgeId, NoemaError> {
        self.require_vertex(src)?;
        self.require_vertex(dst)?;
        let id = EdgeId(self.edges.len());
        self.edges.push(Edge {
            src,
            link: link.clone(),
            dst,
            pref,
        });
        Ok(id)
    }

    /// Current resolution of a vertex.
    #[must_use]
    pub fn idea(&self, vertex: VertexId) -> Option<&NodeHandle> {
        self.vertex(vertex).and_then(Vertex::idea)
    }

    /// Force a resolution without consulting the matcher.
    ///
    /// `Id` vertices are pinned by their matcher and cannot be rebound.
    pub fn set_idea(&mut self, vertex: VertexId, idea: NodeHandle) -> Result<(), NoemaError> {
        let target = self.mutable_vertex(vertex)?;
        target.idea = Some(idea);
        Ok(())
    }

    /// Clear the resolution of one vertex.
    pub fn clear_idea(&mut self, vertex: VertexId) -> Result<(), NoemaError> {
        let target = self.mutable_vertex(vertex)?;
        target.idea = None;
        Ok(())
    }

    /// Clear every resolution except those pinned by `Id` matchers.
    pub fn clear_ideas(&mut self) {
        for vertex in &mut self.vertices {
            if !matches!(vertex.matcher, Matcher::Id(_)) {
                vertex.idea = None;
            }
        }
    }

    /// True when every vertex is bound.
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        self.vertices.iter().all(Vertex::is_resolved)
    }

    /// Look up a vertex.
    #[must_use]
    pub fn vertex(&self, vertex: VertexId) -> Option<&Vertex> {
        self.vertices.get(vertex.0)
    }

    /// Look up an edge.
    #[must_use]
    pub fn edge(&self, edge: EdgeId) -> Option<&Edge> {
        self.edges.get(edge.0)
    }

    /// All vertices with their ids, in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (VertexId(i), v))
    }

    /// All edges with their ids, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter().enumerate().map(|(i, e)| (EdgeId(i), e))
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Check if the subgraph has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check that the subgraph is well formed against `registry`.
    ///
    /// Every edge type must be registered there, and every `Exact`
    /// reference must name another existing vertex.
    pub fn validate(&self, registry: &LinkRegistry) -> Result<(), NoemaError> {
        for (id, edge) in self.edges() {
            registry.validate(&edge.link).map_err(|_| {
                NoemaError::invalid(format!(
                    "edge {} uses unregistered link type '{}'",
                    id,
                    edge.link.name()
                ))
            })?;
        }
        for (id, vertex) in self.vertices() {
            if let Some(target) = vertex.matcher.ref_target() {
                if target == id {
                    return Err(NoemaError::invalid(format!(
                        "vertex {} references itself",
                        id
                    )));
                }
                self.require_vertex(target)?;
            }
        }
        Ok(())
    }

    /// Bind a vertex during search.
    pub(crate) fn resolve(&mut self, vertex: VertexId, idea: NodeHandle) {
        if let Some(target) = self.vertices.get_mut(vertex.0) {
            target.idea = Some(idea);
        }
    }

    fn require_vertex(&self, vertex: VertexId) -> Result<&Vertex, NoemaError> {
        self.vertex(vertex).ok_or_else(|| {
            NoemaError::invalid(format!(
                "vertex {} does not exist (subgraph has {})",
                vertex,
                self.vertices.len()
            ))
        })
    }

    fn mutable_vertex(&mut self, vertex: VertexId) -> Result<&mut Vertex, NoemaError> {
        let count = self.vertices.len();
        let target = self.vertices.get_mut(vertex.0).ok_or_else(|| {
            NoemaError::invalid(format!(
                "vertex {} does not exist (subgraph has {})",
                vertex, count
            ))
        })?;
        if matches!(target.matcher, Matcher::Id(_)) {
            return Err(NoemaError::invalid(format!(
                "vertex {} is pinned by an id matcher",
                vertex
            )));
        }
        Ok(target)
    }
}

// =============================================================================
// TESTS
// =============================================================================
