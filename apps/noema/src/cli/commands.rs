//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Every command opens the configured store, and mutating commands flush it
//! before returning.

use crate::api;
use crate::config::{BackendKind, NoemaConfig};
use noema_core::{Data, GraphStore, NoemaError, SearchEngine, Subgraph};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum pattern file size (1 MB).
const MAX_PATTERN_FILE_SIZE: u64 = 1024 * 1024;

/// Validate a pattern file path and size before reading.
///
/// Canonicalizes the path so `..` and symlinks are resolved, and rejects
/// directories and oversized files.
fn validate_pattern_file(path: &Path) -> Result<PathBuf, NoemaError> {
    let canonical = path.canonicalize().map_err(|e| {
        NoemaError::InvalidArgument(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(NoemaError::InvalidArgument(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    let size = std::fs::metadata(&canonical)?.len();
    if size > MAX_PATTERN_FILE_SIZE {
        return Err(NoemaError::InvalidArgument(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            size, MAX_PATTERN_FILE_SIZE
        )));
    }

    Ok(canonical)
}

/// Parse a JSON object given on the command line.
pub fn parse_data(text: &str) -> Result<Data, NoemaError> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(NoemaError::InvalidArgument(
            "node data must be a JSON object".to_string(),
        )),
        Err(e) => Err(NoemaError::Deserialization(format!("node data: {}", e))),
    }
}

fn print_json(value: &serde_json::Value) -> Result<(), NoemaError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| NoemaError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &NoemaConfig) -> Result<(), NoemaError> {
    let store = config.open_store()?;

    println!("Noema Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", config.server.host);
    println!("  Port:     {}", config.server.port);
    println!("  Backend:  {}", config.storage.backend);
    println!("  Path:     {}", config.storage.path.display());
    println!();
    println!("Endpoints:");
    println!("  GET  /health      - Health check");
    println!("  GET  /link-types  - Registered link types");
    println!("  POST /nodes       - Create a node");
    println!("  GET  /nodes/{{id}}  - Node data and links");
    println!("  POST /link        - Link two nodes");
    println!("  POST /unlink      - Unlink two nodes");
    println!("  POST /search      - Match a subgraph pattern");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&config.server_addr(), store).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize the configured storage.
pub fn cmd_init(config: &NoemaConfig, force: bool) -> Result<(), NoemaError> {
    let path = &config.storage.path;

    match config.storage.backend {
        BackendKind::Memory => {
            println!("Memory backend needs no initialization");
            return Ok(());
        }
        BackendKind::File | BackendKind::Redb if path.exists() && !force => {
            return Err(NoemaError::InvalidArgument(format!(
                "Storage already exists at {}. Use --force to overwrite.",
                path.display()
            )));
        }
        BackendKind::File => {
            if path.exists() {
                std::fs::remove_dir_all(path)?;
            }
            std::fs::create_dir_all(path)?;
        }
        BackendKind::Redb => {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
    }

    let mut store = config.open_store()?;
    store.flush()?;
    println!(
        "Initialized new {} storage at {}",
        config.storage.backend,
        path.display()
    );
    Ok(())
}

// =============================================================================
// NODE COMMANDS
// =============================================================================

/// Create a node, optionally with data.
pub fn cmd_create(
    config: &NoemaConfig,
    json_mode: bool,
    data: Option<&str>,
) -> Result<(), NoemaError> {
    let data = data.map(parse_data).transpose()?;
    let mut store = config.open_store()?;
    let handle = store.create(data)?;
    store.flush()?;

    if json_mode {
        print_json(&serde_json::json!({ "id": handle.id }))?;
    } else {
        println!("Created node {}", handle);
    }
    Ok(())
}

/// Show a node's data and links.
pub fn cmd_show(config: &NoemaConfig, json_mode: bool, id: &str) -> Result<(), NoemaError> {
    let mut store = config.open_store()?;
    let handle = store.load(id)?;
    let data = store.data(&handle)?;
    let links = store.links(&handle)?;

    if json_mode {
        print_json(&serde_json::json!({
            "id": handle.id,
            "data": data,
            "links": links,
        }))?;
    } else {
        println!("Node {}", handle);
        println!("  data: {}", serde_json::Value::Object(data));
        if links.is_empty() {
            println!("  links: (none)");
        }
        for (link, targets) in &links {
            let ids: Vec<&str> = targets.keys().map(|id| id.as_str()).collect();
            println!("  {} -> {}", link, ids.join(", "));
        }
    }
    Ok(())
}

/// Replace a node's data.
pub fn cmd_update(
    config: &NoemaConfig,
    json_mode: bool,
    id: &str,
    data: &str,
) -> Result<(), NoemaError> {
    let data = parse_data(data)?;
    let mut store = config.open_store()?;
    let handle = store.load(id)?;
    store.update(&handle, data)?;
    store.flush()?;

    if json_mode {
        print_json(&serde_json::json!({ "id": handle.id, "success": true }))?;
    } else {
        println!("Updated node {}", handle);
    }
    Ok(())
}

/// Whether `cmd_link` adds or removes the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    Link,
    Unlink,
}

/// Link or unlink two nodes.
pub fn cmd_link(
    config: &NoemaConfig,
    json_mode: bool,
    from: &str,
    link: &str,
    to: &str,
    action: LinkAction,
) -> Result<(), NoemaError> {
    let mut store = config.open_store()?;
    let edge_type = store.registry().require(link)?.clone();
    let source = store.load(from)?;
    let target = store.proxy(to)?;

    match action {
        LinkAction::Link => store.link(&source, &edge_type, &target)?,
        LinkAction::Unlink => store.unlink(&source, &edge_type, &target)?,
    }
    store.flush()?;

    let verb = match action {
        LinkAction::Link => "Linked",
        LinkAction::Unlink => "Unlinked",
    };
    if json_mode {
        print_json(&serde_json::json!({
            "from": source.id,
            "link": link,
            "to": target.id,
            "success": true,
        }))?;
    } else {
        println!("{} {} -({})-> {}", verb, source, link, target);
    }
    Ok(())
}

/// Resolve a named context node.
pub fn cmd_context(config: &NoemaConfig, json_mode: bool, name: &str) -> Result<(), NoemaError> {
    let mut store = config.open_store()?;
    let handle = store.context(name)?;
    store.flush()?;

    if json_mode {
        print_json(&serde_json::json!({ "name": name, "id": handle.id }))?;
    } else {
        println!("Context '{}' is node {}", name, handle);
    }
    Ok(())
}

/// List registered link types.
pub fn cmd_link_types(config: &NoemaConfig, json_mode: bool) -> Result<(), NoemaError> {
    let registry = config.build_registry()?;

    if json_mode {
        let types: Vec<_> = registry.list().collect();
        let value =
            serde_json::to_value(&types).map_err(|e| NoemaError::Serialization(e.to_string()))?;
        print_json(&value)?;
    } else {
        println!("Link types ({}):", registry.len());
        for link in registry.list() {
            let mut flags = Vec::new();
            if link.is_undirected() {
                flags.push("undirected");
            }
            if link.is_transitive() {
                flags.push("transitive");
            }
            if link.is_opp() {
                flags.push("generated");
            }
            println!(
                "  {:<28} opposite: {:<28} {}",
                link.name(),
                link.opposite_name(),
                flags.join(", ")
            );
        }
    }
    Ok(())
}

// =============================================================================
// SEARCH COMMAND
// =============================================================================

/// Run a subgraph pattern from a file against the graph.
pub fn cmd_search(
    config: &NoemaConfig,
    json_mode: bool,
    pattern: &Path,
    drop_ideas: bool,
) -> Result<(), NoemaError> {
    let path = validate_pattern_file(pattern)?;
    let text = std::fs::read_to_string(&path)?;

    let mut store = config.open_store()?;
    let results = run_search(&mut store, &text, drop_ideas)?;

    if json_mode {
        let documents: Vec<_> = results.iter().map(|sg| sg.to_document(false)).collect();
        let value = serde_json::json!({ "count": results.len(), "results": documents });
        print_json(&value)?;
    } else {
        println!("{} match(es)", results.len());
        for (i, result) in results.iter().enumerate() {
            let bindings: Vec<String> = result
                .vertices()
                .map(|(id, vertex)| match vertex.idea() {
                    Some(idea) => format!("{}={}", id, idea),
                    None => format!("{}=?", id),
                })
                .collect();
            println!("  [{}] {}", i, bindings.join(" "));
        }
    }
    Ok(())
}

/// Parse a pattern and search for it.
pub fn run_search(
    store: &mut GraphStore,
    pattern: &str,
    drop_ideas: bool,
) -> Result<Vec<Subgraph>, NoemaError> {
    let mut subgraph = Subgraph::parse(pattern, store.registry())?;
    if drop_ideas {
        subgraph.clear_ideas();
    }
    SearchEngine::search(store, &subgraph)
}
