//! # Noema CLI Module
//!
//! This module implements the CLI interface for Noema.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize the configured storage
//! - `create` - Create a node
//! - `show` - Show a node's data and links
//! - `update` - Replace a node's data
//! - `link` / `unlink` - Add or remove an edge
//! - `context` - Resolve a named context node
//! - `link-types` - List registered link types
//! - `search` - Match a subgraph pattern against the graph

mod commands;

use crate::config::NoemaConfig;
use clap::{Parser, Subcommand};
use noema_core::NoemaError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Noema - knowledge graph store and subgraph matcher
#[derive(Parser, Debug)]
#[command(name = "noema")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: noema.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage backend override: "memory", "file" or "redb"
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Storage path override (directory for file, database for redb)
    #[arg(short = 'P', long, global = true)]
    pub path: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides [server].host)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides [server].port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize the configured storage
    Init {
        /// Wipe existing storage first
        #[arg(short, long)]
        force: bool,
    },

    /// Create a node
    Create {
        /// Node data as a JSON object
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Show a node's data and links
    Show {
        /// Node id
        id: String,
    },

    /// Replace a node's data
    Update {
        /// Node id
        id: String,

        /// New data as a JSON object
        #[arg(short, long)]
        data: String,
    },

    /// Link two nodes
    Link {
        /// Source node id
        from: String,
        /// Link type name
        link: String,
        /// Destination node id
        to: String,
    },

    /// Unlink two nodes
    Unlink {
        /// Source node id
        from: String,
        /// Link type name
        link: String,
        /// Destination node id
        to: String,
    },

    /// Resolve (or create) a named context node
    Context {
        /// Context name
        name: String,
    },

    /// List registered link types
    LinkTypes,

    /// Search the graph with a subgraph pattern
    Search {
        /// Pattern file (subgraph JSON)
        #[arg(short = 'f', long)]
        pattern: PathBuf,

        /// Ignore resolutions stored in the pattern
        #[arg(long)]
        drop_ideas: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), NoemaError> {
    let mut config = NoemaConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli.backend.as_deref(), cli.path.clone())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::Create { data }) => cmd_create(&config, json_mode, data.as_deref()),
        Some(Commands::Show { id }) => cmd_show(&config, json_mode, &id),
        Some(Commands::Update { id, data }) => cmd_update(&config, json_mode, &id, &data),
        Some(Commands::Link { from, link, to }) => {
            cmd_link(&config, json_mode, &from, &link, &to, LinkAction::Link)
        }
        Some(Commands::Unlink { from, link, to }) => {
            cmd_link(&config, json_mode, &from, &link, &to, LinkAction::Unlink)
        }
        Some(Commands::Context { name }) => cmd_context(&config, json_mode, &name),
        Some(Commands::LinkTypes) => cmd_link_types(&config, json_mode),
        Some(Commands::Search {
            pattern,
            drop_ideas,
        }) => cmd_search(&config, json_mode, &pattern, drop_ideas),
        None => {
            // No subcommand - list link types by default
            cmd_link_types(&config, json_mode)
        }
    }
}
