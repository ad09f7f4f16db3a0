//! # redb-backed Boundary
//!
//! A disk-backed boundary using the redb embedded database, providing:
//! - ACID transactions (one per save)
//! - Crash safety (copy-on-write B-trees)
//! - Zero configuration
//!
//! Records are stored as JSON bytes in a single table keyed by
//! `(node id, record kind)`.

use super::{Boundary, decode_record, encode_record};
use crate::ids::validate_record_id;
use crate::{Data, Kind, NodeId, NoemaError};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for records: (node id, kind) -> JSON bytes
const RECORDS: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("records");

fn storage_err(e: impl std::fmt::Display) -> NoemaError {
    NoemaError::Storage(e.to_string())
}

/// A disk-backed boundary using redb.
pub struct RedbBoundary {
    db: Database,
}

impl std::fmt::Debug for RedbBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBoundary").finish_non_exhaustive()
    }
}

impl RedbBoundary {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, NoemaError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        // Initialize the table if it doesn't exist
        let write_txn = db.begin_write().map_err(storage_err)?;
        {
            let _ = write_txn.open_table(RECORDS).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;

        Ok(Self { db })
    }

    /// Count persisted records.
    pub fn len(&self) -> Result<usize, NoemaError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(RECORDS).map_err(storage_err)?;
        let mut count = 0usize;
        for entry in table.iter().map_err(storage_err)? {
            entry.map_err(storage_err)?;
            count = count.saturating_add(1);
        }
        Ok(count)
    }

    /// Check if nothing is persisted.
    pub fn is_empty(&self) -> Result<bool, NoemaError> {
        Ok(self.len()? == 0)
    }
}

impl Boundary for RedbBoundary {
    fn save_obj(&mut self, id: &NodeId, kind: Kind, obj: &Data) -> Result<(), NoemaError> {
        validate_record_id(id.as_str())?;
        let key = (id.as_str(), kind.as_str());

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(RECORDS).map_err(storage_err)?;
            if obj.is_empty() {
                table.remove(key).map_err(storage_err)?;
            } else {
                let bytes = encode_record(obj)?;
                table.insert(key, bytes.as_slice()).map_err(storage_err)?;
            }
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(())
    }

    fn load_obj(&self, id: &NodeId, kind: Kind) -> Result<Option<Data>, NoemaError> {
        validate_record_id(id.as_str())?;

        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(RECORDS).map_err(storage_err)?;

        match table
            .get((id.as_str(), kind.as_str()))
            .map_err(storage_err)?
        {
            Some(bytes) => decode_record(bytes.value()).map(Some),
            None => Ok(None),
        }
    }
}
