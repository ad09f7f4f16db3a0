//! # Load/Save Boundary
//!
//! The persistence seam beneath `GraphStore`.
//!
//! A boundary stores two JSON-object records per node (`data` and `links`).
//! Saving an empty object deletes the record; loading a missing record
//! yields `None`. Boundary errors are returned as-is; the store neither
//! retries nor masks them.
//!
//! ## Backends
//!
//! - `MemoryBoundary`: in-process maps (ephemeral, tests)
//! - `FileBoundary`: one JSON file per record, sharded by id prefix
//! - `RedbBoundary`: embedded ACID database

mod file;
mod memory;
mod redb_store;

pub use file::FileBoundary;
pub use memory::MemoryBoundary;
pub use redb_store::RedbBoundary;

use crate::{Data, Kind, NodeId, NoemaError};

/// The load/save contract used by `GraphStore`.
pub trait Boundary {
    /// Persist `obj` as the `kind` record of `id`. An empty `obj` deletes it.
    fn save_obj(&mut self, id: &NodeId, kind: Kind, obj: &Data) -> Result<(), NoemaError>;

    /// Fetch the `kind` record of `id`, or `None` if nothing is persisted.
    fn load_obj(&self, id: &NodeId, kind: Kind) -> Result<Option<Data>, NoemaError>;
}

/// Storage backend for a `GraphStore`.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory records (volatile).
    Memory(MemoryBoundary),
    /// Sharded JSON files under a root directory.
    File(FileBoundary),
    /// Disk-backed records using redb (ACID, persistent).
    Redb(RedbBoundary),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::Memory(MemoryBoundary::new())
    }
}

impl StorageBackend {
    /// Short name of the backend, as used in configuration.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::File(_) => "file",
            Self::Redb(_) => "redb",
        }
    }

    /// Check if records survive the process.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        !matches!(self, Self::Memory(_))
    }
}

impl Boundary for StorageBackend {
    fn save_obj(&mut self, id: &NodeId, kind: Kind, obj: &Data) -> Result<(), NoemaError> {
        match self {
            Self::Memory(b) => b.save_obj(id, kind, obj),
            Self::File(b) => b.save_obj(id, kind, obj),
            Self::Redb(b) => b.save_obj(id, kind, obj),
        }
    }

    fn load_obj(&self, id: &NodeId, kind: Kind) -> Result<Option<Data>, NoemaError> {
        match self {
            Self::Memory(b) => b.load_obj(id, kind),
            Self::File(b) => b.load_obj(id, kind),
            Self::Redb(b) => b.load_obj(id, kind),
        }
    }
}

/// Decode a stored record, requiring a JSON object.
pub(crate) fn decode_record(bytes: &[u8]) -> Result<Data, NoemaError> {
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(NoemaError::Deserialization(format!(
            "expected a JSON object record, found {}",
            json_type_name(&other)
        ))),
        Err(e) => Err(NoemaError::Deserialization(e.to_string())),
    }
}

/// Encode a record as JSON bytes.
pub(crate) fn encode_record(obj: &Data) -> Result<Vec<u8>, NoemaError> {
    serde_json::to_vec(obj).map_err(|e| NoemaError::Serialization(e.to_string()))
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
