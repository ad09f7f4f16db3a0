//! # noema
//!
//! Application layer over `noema-core`: configuration, CLI commands and the
//! HTTP API. The binary in `main.rs` only installs logging and dispatches.

pub mod api;
pub mod cli;
pub mod config;
