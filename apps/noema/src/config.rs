//! # Configuration
//!
//! TOML configuration for the Noema binary.
//!
//! ```toml
//! [storage]
//! backend = "file"        # memory | file | redb
//! path = "noema-data"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [[link_types]]
//! name = "type_of"
//! transitive = true
//! ```
//!
//! Every section is optional. Link types listed here are registered into the
//! store at startup, in file order.

use noema_core::primitives::TRANSITIVE_OPTION;
use noema_core::{
    Data, FileBoundary, GraphStore, LinkRegistry, MemoryBoundary, NoemaError, RedbBoundary,
    StorageBackend,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "noema.toml";

// =============================================================================
// CONFIG TYPES
// =============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoemaConfig {
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub link_types: Vec<LinkTypeConfig>,
}

impl Default for NoemaConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
            link_types: vec![
                LinkTypeConfig::new("thought_description", false, false),
                LinkTypeConfig::new("type_of", false, true),
            ],
        }
    }
}

/// Which boundary backs the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    File,
    Redb,
}

impl FromStr for BackendKind {
    type Err = NoemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "redb" => Ok(Self::Redb),
            other => Err(NoemaError::InvalidArgument(format!(
                "unknown storage backend '{}' (expected memory, file or redb)",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Redb => "redb",
        })
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendKind,
    /// Directory for `file`, database file for `redb`, ignored for `memory`.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::File,
            path: PathBuf::from("noema-data"),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// One `[[link_types]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTypeConfig {
    pub name: String,
    #[serde(default)]
    pub undirected: bool,
    #[serde(default)]
    pub transitive: bool,
}

impl LinkTypeConfig {
    /// Create a link type entry.
    #[must_use]
    pub fn new(name: impl Into<String>, undirected: bool, transitive: bool) -> Self {
        Self {
            name: name.into(),
            undirected,
            transitive,
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl NoemaConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, NoemaError> {
        toml::from_str(text).map_err(|e| NoemaError::Deserialization(format!("config: {}", e)))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `DEFAULT_CONFIG_FILE` is
    /// read if present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, NoemaError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };

        let text = std::fs::read_to_string(&path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Apply `--backend` / `--path` command-line overrides.
    pub fn apply_overrides(
        &mut self,
        backend: Option<&str>,
        path: Option<PathBuf>,
    ) -> Result<(), NoemaError> {
        if let Some(backend) = backend {
            self.storage.backend = backend.parse()?;
        }
        if let Some(path) = path {
            self.storage.path = path;
        }
        Ok(())
    }

    /// Build the link registry described by `[[link_types]]`.
    pub fn build_registry(&self) -> Result<LinkRegistry, NoemaError> {
        let mut registry = LinkRegistry::new();
        for link in &self.link_types {
            let mut options = Data::new();
            options.insert(
                TRANSITIVE_OPTION.to_string(),
                serde_json::Value::Bool(link.transitive),
            );
            registry.create(&link.name, link.undirected, options)?;
        }
        Ok(registry)
    }

    /// Open the configured boundary.
    pub fn open_backend(&self) -> Result<StorageBackend, NoemaError> {
        let path = &self.storage.path;
        Ok(match self.storage.backend {
            BackendKind::Memory => StorageBackend::Memory(MemoryBoundary::new()),
            BackendKind::File => StorageBackend::File(FileBoundary::new(path)),
            BackendKind::Redb => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                StorageBackend::Redb(RedbBoundary::open(path)?)
            }
        })
    }

    /// Open a store over the configured boundary with the configured
    /// link types registered.
    pub fn open_store(&self) -> Result<GraphStore, NoemaError> {
        let registry = self.build_registry()?;
        let store = GraphStore::open(self.open_backend()?)?.with_registry(registry);
        tracing::info!(
            backend = %self.storage.backend,
            path = %self.storage.path.display(),
            link_types = store.registry().len(),
            "opened graph store"
        );
        Ok(store)
    }

    /// `host:port` for the HTTP server.
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
