//! # Noema
//!
//! The main binary for the Noema knowledge graph.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for node, link and search operations
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │               apps/noema (THE BINARY)           │
//! │                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────┐  │
//! │  │   CLI       │  │   HTTP API  │  │ config  │  │
//! │  │  (clap)     │  │   (axum)    │  │ (toml)  │  │
//! │  └──────┬──────┘  └──────┬──────┘  └────┬────┘  │
//! │         └────────────────┼──────────────┘       │
//! │                          ▼                      │
//! │                  ┌───────────────┐              │
//! │                  │  noema-core   │              │
//! │                  │ store+search  │              │
//! │                  └───────────────┘              │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! noema server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! noema create --data '{"name":"apple"}'
//! noema link 1 thought_description 2
//! noema search --pattern pattern.json
//! ```

use clap::Parser;
use noema::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // NOEMA_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("NOEMA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "noema=info,noema_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  noema v{}
  knowledge graph store and subgraph matcher
"#,
        env!("CARGO_PKG_VERSION")
    );
}
