//! # Search Engine
//!
//! Backtracking subgraph matcher.
//!
//! A search repeatedly picks one unsettled pattern edge with a bound
//! endpoint, enumerates the graph neighbors of that endpoint through the
//! `GraphStore`, and branches one copy of the pattern per neighbor accepted
//! by the far vertex's matcher. A branch succeeds once every vertex is bound
//! and every edge has been checked against the graph; it dies silently when
//! no edge can be expanded or an expansion yields no neighbor.
//!
//! ## Edge selection
//!
//! Among unsettled edges with at least one bound endpoint:
//! 1. edges with both endpoints bound come first (pure consistency checks)
//! 2. then the highest `pref`
//! 3. then insertion order
//!
//! The insertion-order tie-break is stable but is an implementation detail.
//!
//! ## Branching
//!
//! Branches live on an explicit work stack, so pattern size is not limited
//! by the call stack. Each branch owns a deep copy of the pattern; no state
//! is shared between siblings or with the caller's subgraph.

use crate::links::EdgeType;
use crate::store::GraphStore;
use crate::subgraph::{EdgeId, Subgraph, VertexId};
use crate::{Data, NodeHandle, NoemaError};

// =============================================================================
// TYPES
// =============================================================================

/// How an edge is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Source is bound: follow the edge type outward to bind the destination.
    FromSrc,
    /// Destination is bound: follow the opposite type to bind the source.
    FromDst,
    /// Both ends are bound: check that the graph actually has this edge.
    Pinned,
}

/// An edge chosen for expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expansion {
    /// The pattern edge.
    pub edge: EdgeId,
    /// Which side the expansion starts from.
    pub direction: Direction,
}

/// One candidate resolution path.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    subgraph: Subgraph,
    settled: Vec<bool>,
}

impl Branch {
    /// Start a branch with every edge unsettled.
    #[must_use]
    pub fn new(subgraph: Subgraph) -> Self {
        let settled = vec![false; subgraph.edge_count()];
        Self { subgraph, settled }
    }

    /// The pattern of this branch.
    #[must_use]
    pub fn subgraph(&self) -> &Subgraph {
        &self.subgraph
    }

    /// Take the pattern out of the branch.
    #[must_use]
    pub fn into_subgraph(self) -> Subgraph {
        self.subgraph
    }

    /// Check if an edge has already been matched against the graph.
    #[must_use]
    pub fn is_settled(&self, edge: EdgeId) -> bool {
        self.settled.get(edge.index()).copied().unwrap_or(false)
    }

    /// Check if every edge has been matched against the graph.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.settled.iter().all(|s| *s)
    }

    fn settle(&mut self, edge: EdgeId) {
        if let Some(flag) = self.settled.get_mut(edge.index()) {
            *flag = true;
        }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// The search engine.
pub struct SearchEngine;

impl SearchEngine {
    /// Find every binding of `subgraph` against the graph in `store`.
    ///
    /// An already-concrete subgraph is returned as a single copy without
    /// consulting the graph. Every result is an independent copy; the
    /// caller's subgraph is never modified.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the subgraph uses a link type not registered
    ///   in `store` or an `exact` reference to a missing vertex
    /// - boundary errors raised while faulting nodes in
    pub fn search(store: &mut GraphStore, subgraph: &Subgraph) -> Result<Vec<Subgraph>, NoemaError> {
        subgraph.validate(store.registry())?;
        tracing::debug!(
            vertices = subgraph.len(),
            edges = subgraph.edge_count(),
            "search started"
        );

        if subgraph.is_concrete() {
            tracing::debug!(results = 1, "search finished on concrete subgraph");
            return Ok(vec![subgraph.clone()]);
        }

        let mut stack = vec![Branch::new(subgraph.clone())];
        let mut results = Vec::new();
        let mut expansions = 0usize;

        while let Some(branch) = stack.pop() {
            match Self::find_edge_to_expand(&branch) {
                Some(expansion) => {
                    expansions = expansions.saturating_add(1);
                    let children = Self::expand_edge(store, &branch, expansion)?;
                    // Reversed so the first neighbor is explored first.
                    stack.extend(children.into_iter().rev());
                }
                None if branch.subgraph.is_concrete() && branch.is_complete() => {
                    results.push(branch.into_subgraph());
                }
                None => {
                    tracing::trace!("branch exhausted without binding every vertex");
                }
            }
        }

        tracing::debug!(results = results.len(), expansions, "search finished");
        Ok(results)
    }

    /// Pick the next edge to expand in `branch`, if any can be.
    #[must_use]
    pub fn find_edge_to_expand(branch: &Branch) -> Option<Expansion> {
        let subgraph = &branch.subgraph;
        let mut best: Option<((u8, i64), Expansion)> = None;

        for (id, edge) in subgraph.edges() {
            if branch.is_settled(id) {
                continue;
            }
            let src_bound = subgraph.idea(edge.src()).is_some();
            let dst_bound = subgraph.idea(edge.dst()).is_some();
            let (bound, direction) = match (src_bound, dst_bound) {
                (true, true) => (2, Direction::Pinned),
                (true, false) => (1, Direction::FromSrc),
                (false, true) => (1, Direction::FromDst),
                (false, false) => continue,
            };

            let rank = (bound, edge.pref());
            // Strictly greater keeps the earliest edge on ties.
            if best.as_ref().is_none_or(|(current, _)| rank > *current) {
                best = Some((rank, Expansion { edge: id, direction }));
            }
        }

        best.map(|(_, expansion)| expansion)
    }

    /// Expand one edge of `branch`, returning the child branches.
    ///
    /// A pinned edge yields the branch itself (with the edge settled) when
    /// the graph has the edge and nothing otherwise. A one-sided expansion
    /// yields one child per accepted neighbor.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `expansion` does not fit the branch (unknown
    /// edge, or endpoints not bound as `direction` requires).
    pub fn expand_edge(
        store: &mut GraphStore,
        branch: &Branch,
        expansion: Expansion,
    ) -> Result<Vec<Branch>, NoemaError> {
        let subgraph = &branch.subgraph;
        let edge = subgraph.edge(expansion.edge).ok_or_else(|| {
            NoemaError::invalid(format!("edge {} does not exist", expansion.edge))
        })?;
        let src = subgraph.idea(edge.src()).cloned();
        let dst = subgraph.idea(edge.dst()).cloned();

        match (expansion.direction, src, dst) {
            (Direction::Pinned, Some(src), Some(dst)) => {
                let neighbors = store.neighbors(&src, edge.link())?;
                if neighbors.contains(&dst) {
                    let mut child = branch.clone();
                    child.settle(expansion.edge);
                    Ok(vec![child])
                } else {
                    tracing::trace!(
                        edge = %expansion.edge,
                        link = edge.link().name(),
                        src = %src,
                        dst = %dst,
                        "pinned edge missing from graph, branch pruned"
                    );
                    Ok(Vec::new())
                }
            }
            (Direction::FromSrc, Some(near), None) => {
                let link = edge.link().clone();
                Self::bind_far(store, branch, expansion, &near, &link, edge.dst())
            }
            (Direction::FromDst, None, Some(near)) => {
                let link = store.registry().opposite(edge.link())?.clone();
                Self::bind_far(store, branch, expansion, &near, &link, edge.src())
            }
            (direction, _, _) => Err(NoemaError::invalid(format!(
                "edge {} cannot be expanded {:?} in this branch",
                expansion.edge, direction
            ))),
        }
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// Branch once per neighbor of `near` under `link` that `far` accepts.
    fn bind_far(
        store: &mut GraphStore,
        branch: &Branch,
        expansion: Expansion,
        near: &NodeHandle,
        link: &EdgeType,
        far: VertexId,
    ) -> Result<Vec<Branch>, NoemaError> {
        let candidates = store.neighbors(near, link)?;
        let mut children = Vec::new();

        for candidate in &candidates {
            if Self::admits(store, &branch.subgraph, far, candidate)? {
                let mut child = branch.clone();
                child.subgraph.resolve(far, candidate.clone());
                child.settle(expansion.edge);
                children.push(child);
            }
        }

        tracing::trace!(
            edge = %expansion.edge,
            direction = ?expansion.direction,
            link = link.name(),
            from = %near,
            candidates = candidates.len(),
            accepted = children.len(),
            "expanded edge"
        );
        Ok(children)
    }

    /// Decide whether binding `far` to `candidate` is consistent.
    ///
    /// Checks the far vertex's own matcher, and the `exact` references held
    /// by already-bound vertices that point at `far`.
    fn admits(
        store: &mut GraphStore,
        subgraph: &Subgraph,
        far: VertexId,
        candidate: &NodeHandle,
    ) -> Result<bool, NoemaError> {
        let Some(vertex) = subgraph.vertex(far) else {
            return Ok(false);
        };
        let matcher = vertex.matcher();

        let referenced = match matcher.ref_target().and_then(|r| subgraph.idea(r)) {
            Some(bound) => Some(store.data(bound)?),
            None => None,
        };
        let referrers: Vec<NodeHandle> = subgraph
            .vertices()
            .filter(|(_, v)| v.matcher().ref_target() == Some(far))
            .filter_map(|(_, v)| v.idea().cloned())
            .collect();

        let data = if matcher.needs_data() || !referrers.is_empty() {
            store.data(candidate)?
        } else {
            Data::new()
        };

        if !matcher.accepts(candidate, &data, referenced.as_ref()) {
            return Ok(false);
        }
        for referrer in &referrers {
            if store.data(referrer)? != data {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

// =============================================================================
// TESTS
// =============================================================================
