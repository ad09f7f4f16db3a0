//! In-memory boundary for ephemeral stores and tests.

use super::Boundary;
use crate::{Data, Kind, NodeId, NoemaError};
use std::collections::BTreeMap;

/// Records kept in a `BTreeMap`; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryBoundary {
    records: BTreeMap<(NodeId, Kind), Data>,
}

impl MemoryBoundary {
    /// Create an empty boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing is persisted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check if a record is persisted.
    #[must_use]
    pub fn contains(&self, id: &NodeId, kind: Kind) -> bool {
        self.records.contains_key(&(id.clone(), kind))
    }
}

impl Boundary for MemoryBoundary {
    fn save_obj(&mut self, id: &NodeId, kind: Kind, obj: &Data) -> Result<(), NoemaError> {
        let key = (id.clone(), kind);
        if obj.is_empty() {
            self.records.remove(&key);
        } else {
            self.records.insert(key, obj.clone());
        }
        Ok(())
    }

    fn load_obj(&self, id: &NodeId, kind: Kind) -> Result<Option<Data>, NoemaError> {
        Ok(self.records.get(&(id.clone(), kind)).cloned())
    }
}
