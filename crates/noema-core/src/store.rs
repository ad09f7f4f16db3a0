//! # Graph Store
//!
//! Node identity, the node cache, and node lifecycle for Noema.
//!
//! Nodes are addressed through `NodeHandle`s that carry only an id. Every
//! data or adjacency access goes through the store, which faults the node
//! in from the boundary on first use. The cache is correctness-neutral:
//! whether a node is cached only decides whether the boundary is hit.
//!
//! Adjacency is kept symmetric. Linking `a -(t)-> b` also records
//! `b -(t.opposite)-> a`, unlinking removes both, and a type whose last
//! neighbor is removed disappears from the node's adjacency.

use crate::ids::{next_id, validate_id};
use crate::links::{EdgeType, LinkRegistry};
use crate::primitives::{FIRST_ID, SETTINGS_ID};
use crate::storage::{Boundary, StorageBackend};
use crate::{Data, Kind, Links, NodeHandle, NodeId, NoemaError};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// CACHED STATE
// =============================================================================

/// In-process state of one node.
#[derive(Debug, Clone, Default)]
struct CachedNode {
    data: Data,
    links: Links,
}

/// Process-wide settings persisted under `SETTINGS_ID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Settings {
    next_id: String,
    #[serde(default)]
    contexts: BTreeMap<String, NodeId>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            next_id: FIRST_ID.to_string(),
            contexts: BTreeMap::new(),
        }
    }
}

fn settings_id() -> NodeId {
    NodeId::new(SETTINGS_ID)
}

/// Pull a node's records from the boundary. Missing records default to empty.
fn fetch(backend: &StorageBackend, id: &NodeId) -> Result<CachedNode, NoemaError> {
    let data = backend.load_obj(id, Kind::Data)?.unwrap_or_default();
    let links = match backend.load_obj(id, Kind::Links)? {
        Some(obj) => serde_json::from_value(serde_json::Value::Object(obj))
            .map_err(|e| NoemaError::Deserialization(format!("links of {}: {}", id, e)))?,
        None => Links::new(),
    };
    tracing::debug!(node = %id, "faulted node into cache");
    Ok(CachedNode { data, links })
}

fn links_to_record(links: &Links) -> Result<Data, NoemaError> {
    match serde_json::to_value(links) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(NoemaError::Serialization(
            "adjacency did not serialize to an object".to_string(),
        )),
        Err(e) => Err(NoemaError::Serialization(e.to_string())),
    }
}

// =============================================================================
// GRAPH STORE
// =============================================================================

/// Owner of the node cache, the link registry, and the boundary.
///
/// The store assumes a single logical thread of control. Callers sharing it
/// across tasks must serialize access (the app wraps it in a `RwLock`).
#[derive(Debug, Default)]
pub struct GraphStore {
    backend: StorageBackend,
    registry: LinkRegistry,
    cache: BTreeMap<NodeId, CachedNode>,
    settings: Settings,
}

impl GraphStore {
    /// Create a store over a fresh in-memory boundary.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store over `backend`, restoring persisted settings.
    pub fn open(backend: StorageBackend) -> Result<Self, NoemaError> {
        let settings = match backend.load_obj(&settings_id(), Kind::Data)? {
            Some(obj) => serde_json::from_value(serde_json::Value::Object(obj))
                .map_err(|e| NoemaError::Deserialization(format!("settings: {}", e)))?,
            None => Settings::default(),
        };
        Ok(Self {
            backend,
            registry: LinkRegistry::new(),
            cache: BTreeMap::new(),
            settings,
        })
    }

    /// Replace the link registry.
    #[must_use]
    pub fn with_registry(mut self, registry: LinkRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The link registry.
    #[must_use]
    pub fn registry(&self) -> &LinkRegistry {
        &self.registry
    }

    /// Mutable access to the link registry (registration only; the registry
    /// exposes no removal).
    pub fn registry_mut(&mut self) -> &mut LinkRegistry {
        &mut self.registry
    }

    /// The storage backend.
    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    // =========================================================================
    // LINK TYPES
    // =========================================================================

    /// Register an edge type. See `LinkRegistry::create`.
    pub fn create_link_type(
        &mut self,
        name: &str,
        undirected: bool,
        options: Data,
    ) -> Result<EdgeType, NoemaError> {
        self.registry.create(name, undirected, options)
    }

    /// All registered edge types in registration order.
    pub fn list_link_types(&self) -> impl Iterator<Item = &EdgeType> {
        self.registry.list()
    }

    // =========================================================================
    // NODE LIFECYCLE
    // =========================================================================

    /// Create a node with a freshly allocated id.
    ///
    /// If `data` is supplied the node is written through to the boundary
    /// immediately.
    pub fn create(&mut self, data: Option<Data>) -> Result<NodeHandle, NoemaError> {
        let id = self.allocate_id()?;
        let supplied = data.is_some();
        self.cache.insert(
            id.clone(),
            CachedNode {
                data: data.unwrap_or_default(),
                links: Links::new(),
            },
        );
        if supplied {
            self.save(&id)?;
        }
        Ok(NodeHandle { id })
    }

    /// Fault a node into the cache if needed and return its handle.
    pub fn load(&mut self, node: impl Into<NodeId>) -> Result<NodeHandle, NoemaError> {
        let id = node.into();
        validate_id(&id)?;
        self.cached(&id)?;
        Ok(NodeHandle { id })
    }

    /// Push a cached node's data and adjacency through the boundary.
    ///
    /// A node that is not cached has nothing to save; this is a no-op.
    pub fn save(&mut self, node: impl Into<NodeId>) -> Result<(), NoemaError> {
        let id = node.into();
        validate_id(&id)?;
        let Some(cached) = self.cache.get(&id) else {
            return Ok(());
        };
        let links = links_to_record(&cached.links)?;
        self.backend.save_obj(&id, Kind::Data, &cached.data)?;
        self.backend.save_obj(&id, Kind::Links, &links)?;
        Ok(())
    }

    /// Save a node and evict it from the cache.
    ///
    /// Handles stay valid; the next access reloads the node.
    pub fn close(&mut self, node: impl Into<NodeId>) -> Result<(), NoemaError> {
        let id = node.into();
        self.save(&id)?;
        self.cache.remove(&id);
        Ok(())
    }

    /// Save every cached node.
    pub fn flush(&mut self) -> Result<(), NoemaError> {
        let ids: Vec<NodeId> = self.cache.keys().cloned().collect();
        for id in ids {
            self.save(id)?;
        }
        Ok(())
    }

    /// Wrap an id in a handle without touching the cache or the boundary.
    pub fn proxy(&self, node: impl Into<NodeId>) -> Result<NodeHandle, NoemaError> {
        let id = node.into();
        validate_id(&id)?;
        Ok(NodeHandle { id })
    }

    /// The node anchored under `name`, creating it on first use.
    ///
    /// The mapping is persisted with the store settings, so it is stable
    /// across restarts over the same boundary.
    pub fn context(&mut self, name: &str) -> Result<NodeHandle, NoemaError> {
        if name.is_empty() {
            return Err(NoemaError::invalid("context name must not be empty"));
        }
        if let Some(id) = self.settings.contexts.get(name) {
            return self.proxy(id);
        }
        let handle = self.create(None)?;
        self.settings
            .contexts
            .insert(name.to_string(), handle.id.clone());
        self.save_settings()?;
        Ok(handle)
    }

    /// Check if a node is currently cached.
    #[must_use]
    pub fn is_cached(&self, node: &NodeHandle) -> bool {
        self.cache.contains_key(&node.id)
    }

    // =========================================================================
    // NODE DATA
    // =========================================================================

    /// A copy of the node's data.
    pub fn data(&mut self, node: &NodeHandle) -> Result<Data, NoemaError> {
        validate_id(&node.id)?;
        Ok(self.cached(&node.id)?.data.clone())
    }

    /// Replace the node's data.
    pub fn update(&mut self, node: &NodeHandle, data: Data) -> Result<(), NoemaError> {
        validate_id(&node.id)?;
        self.cached(&node.id)?.data = data;
        Ok(())
    }

    /// A copy of the node's full adjacency.
    pub fn links(&mut self, node: &NodeHandle) -> Result<Links, NoemaError> {
        validate_id(&node.id)?;
        Ok(self.cached(&node.id)?.links.clone())
    }

    // =========================================================================
    // ADJACENCY
    // =========================================================================

    /// Add `node -(link)-> other` and the reverse `other -(opposite)-> node`.
    pub fn link(
        &mut self,
        node: &NodeHandle,
        link: &EdgeType,
        other: impl Into<NodeId>,
    ) -> Result<(), NoemaError> {
        let other = other.into();
        let opposite = self.check_link_args(node, link, &other)?;
        self.fault_pair(&node.id, &other)?;

        self.cached(&node.id)?
            .links
            .entry(link.name().to_string())
            .or_default()
            .insert(other.clone(), Data::new());
        self.cached(&other)?
            .links
            .entry(opposite)
            .or_default()
            .insert(node.id.clone(), Data::new());
        Ok(())
    }

    /// Remove `node -(link)-> other` and its reverse.
    pub fn unlink(
        &mut self,
        node: &NodeHandle,
        link: &EdgeType,
        other: impl Into<NodeId>,
    ) -> Result<(), NoemaError> {
        let other = other.into();
        let opposite = self.check_link_args(node, link, &other)?;
        self.fault_pair(&node.id, &other)?;

        Self::remove_neighbor(self.cached(&node.id)?, link.name(), &other);
        Self::remove_neighbor(self.cached(&other)?, &opposite, &node.id);
        Ok(())
    }

    /// Direct neighbors of `node` under `link`, ordered by id.
    pub fn linked(
        &mut self,
        node: &NodeHandle,
        link: &EdgeType,
    ) -> Result<Vec<NodeHandle>, NoemaError> {
        validate_id(&node.id)?;
        self.registry.validate(link)?;
        Ok(self
            .neighbor_ids(&node.id, link.name())?
            .into_iter()
            .map(|id| NodeHandle { id })
            .collect())
    }

    /// Every node reachable from `node` by repeatedly following `link`.
    ///
    /// Breadth-first, with each hop level enumerated in id order. `node`
    /// itself is included only when a self-loop or cycle leads back to it.
    pub fn linked_transitive(
        &mut self,
        node: &NodeHandle,
        link: &EdgeType,
    ) -> Result<Vec<NodeHandle>, NoemaError> {
        validate_id(&node.id)?;
        self.registry.validate(link)?;

        let mut visited = BTreeSet::new();
        let mut reached = Vec::new();
        let mut frontier = vec![node.id.clone()];

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for current in &frontier {
                for neighbor in self.neighbor_ids(current, link.name())? {
                    if visited.insert(neighbor.clone()) {
                        reached.push(NodeHandle {
                            id: neighbor.clone(),
                        });
                        next.push(neighbor);
                    }
                }
            }
            frontier = next;
        }

        Ok(reached)
    }

    /// Neighbors as seen by the search: transitive closure for transitive
    /// types, one hop otherwise.
    pub fn neighbors(
        &mut self,
        node: &NodeHandle,
        link: &EdgeType,
    ) -> Result<Vec<NodeHandle>, NoemaError> {
        if link.is_transitive() {
            self.linked_transitive(node, link)
        } else {
            self.linked(node, link)
        }
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// The cached state of `id`, faulting it in from the boundary if needed.
    fn cached(&mut self, id: &NodeId) -> Result<&mut CachedNode, NoemaError> {
        match self.cache.entry(id.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let node = fetch(&self.backend, id)?;
                Ok(entry.insert(node))
            }
        }
    }

    /// Fault both endpoints of a link change in, so a failed load leaves
    /// neither side mutated.
    fn fault_pair(&mut self, node: &NodeId, other: &NodeId) -> Result<(), NoemaError> {
        self.cached(node)?;
        self.cached(other)?;
        Ok(())
    }

    fn neighbor_ids(&mut self, id: &NodeId, link_name: &str) -> Result<Vec<NodeId>, NoemaError> {
        Ok(self
            .cached(id)?
            .links
            .get(link_name)
            .map(|targets| targets.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Validate link/unlink arguments before any mutation and return the
    /// name of the opposite type.
    fn check_link_args(
        &self,
        node: &NodeHandle,
        link: &EdgeType,
        other: &NodeId,
    ) -> Result<String, NoemaError> {
        validate_id(&node.id)?;
        validate_id(other)?;
        Ok(self.registry.opposite(link)?.name().to_string())
    }

    fn remove_neighbor(node: &mut CachedNode, link_name: &str, neighbor: &NodeId) {
        if let Some(targets) = node.links.get_mut(link_name) {
            targets.remove(neighbor);
            if targets.is_empty() {
                node.links.remove(link_name);
            }
        }
    }

    fn allocate_id(&mut self) -> Result<NodeId, NoemaError> {
        let id = NodeId::new(self.settings.next_id.clone());
        self.settings.next_id = next_id(&self.settings.next_id);
        self.save_settings()?;
        Ok(id)
    }

    fn save_settings(&mut self) -> Result<(), NoemaError> {
        let record = match serde_json::to_value(&self.settings) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => {
                return Err(NoemaError::Serialization(
                    "settings did not serialize to an object".to_string(),
                ));
            }
            Err(e) => return Err(NoemaError::Serialization(e.to_string())),
        };
        self.backend.save_obj(&settings_id(), Kind::Data, &record)
    }
}

// =============================================================================
// TESTS
// =============================================================================
