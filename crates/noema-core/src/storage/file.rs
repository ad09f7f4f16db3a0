//! File-backed boundary.
//!
//! Each record is a JSON file. The id is split into two-character chunks and
//! every chunk but the last becomes a directory level, so `123456` is stored
//! at `<root>/12/34/123456_data.json`. This keeps directories small without
//! an index.

use super::{Boundary, decode_record, encode_record};
use crate::ids::validate_record_id;
use crate::{Data, Kind, NodeId, NoemaError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Sharded JSON files under a root directory.
#[derive(Debug, Clone)]
pub struct FileBoundary {
    root: PathBuf,
}

impl FileBoundary {
    /// Use `root` as the storage directory. It is created lazily on the
    /// first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a record file.
    ///
    /// Rejects ids that could escape the root before any path is built.
    pub fn record_path(&self, id: &NodeId, kind: Kind) -> Result<PathBuf, NoemaError> {
        let id = id.as_str();
        validate_record_id(id)?;

        let mut path = self.root.clone();
        let chunks: Vec<&str> = (0..id.len())
            .step_by(2)
            .map(|start| &id[start..id.len().min(start + 2)])
            .collect();
        for chunk in chunks.iter().take(chunks.len().saturating_sub(1)) {
            path.push(chunk);
        }
        path.push(format!("{}_{}.json", id, kind));
        Ok(path)
    }
}

impl Boundary for FileBoundary {
    fn save_obj(&mut self, id: &NodeId, kind: Kind, obj: &Data) -> Result<(), NoemaError> {
        let path = self.record_path(id, kind)?;

        if obj.is_empty() {
            return match std::fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            };
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, encode_record(obj)?)?;
        tracing::trace!(path = %path.display(), "wrote record");
        Ok(())
    }

    fn load_obj(&self, id: &NodeId, kind: Kind) -> Result<Option<Data>, NoemaError> {
        let path = self.record_path(id, kind)?;
        match std::fs::read(&path) {
            Ok(bytes) => decode_record(&bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn record_paths_are_sharded_by_prefix_pairs() {
        let boundary = FileBoundary::new("/data");

        let path = boundary
            .record_path(&NodeId::new("123456"), Kind::Data)
            .expect("path");
        assert_eq!(path, PathBuf::from("/data/12/34/123456_data.json"));

        let path = boundary
            .record_path(&NodeId::new("12345"), Kind::Links)
            .expect("path");
        assert_eq!(path, PathBuf::from("/data/12/34/12345_links.json"));

        let path = boundary
            .record_path(&NodeId::new("7"), Kind::Data)
            .expect("path");
        assert_eq!(path, PathBuf::from("/data/7_data.json"));
    }

    #[test]
    fn unsafe_ids_are_rejected() {
        let boundary = FileBoundary::new("/data");
        assert!(matches!(
            boundary.record_path(&NodeId::new("../../etc/passwd"), Kind::Data),
            Err(NoemaError::InvalidArgument(_))
        ));
        assert!(boundary.record_path(&NodeId::new(""), Kind::Data).is_err());
    }

    #[test]
    fn save_load_delete() {
        let temp = tempdir().expect("temp dir");
        let mut boundary = FileBoundary::new(temp.path());
        let id = NodeId::new("abcd");
        let mut obj = Data::new();
        obj.insert("value".to_string(), json!(10));

        boundary.save_obj(&id, Kind::Data, &obj).expect("save");
        assert!(temp.path().join("ab").join("abcd_data.json").is_file());
        assert_eq!(boundary.load_obj(&id, Kind::Data).expect("load"), Some(obj));
        assert_eq!(boundary.load_obj(&id, Kind::Links).expect("load"), None);

        boundary.save_obj(&id, Kind::Data, &Data::new()).expect("delete");
        assert_eq!(boundary.load_obj(&id, Kind::Data).expect("load"), None);

        // Deleting a missing record is not an error.
        boundary.save_obj(&id, Kind::Data, &Data::new()).expect("delete again");
    }

    #[test]
    fn corrupted_record_surfaces_error() {
        let temp = tempdir().expect("temp dir");
        let boundary = FileBoundary::new(temp.path());
        std::fs::write(temp.path().join("9_data.json"), b"{oops").expect("write");

        assert!(matches!(
            boundary.load_obj(&NodeId::new("9"), Kind::Data),
            Err(NoemaError::Deserialization(_))
        ));
    }
}
