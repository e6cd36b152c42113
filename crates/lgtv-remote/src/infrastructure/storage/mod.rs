//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module handles:
//!
//! - Reading the TOML configuration file from the platform-appropriate directory
//!   (or an explicit `--config` path).
//! - Overwriting the saved TV record after every successful connect, so the
//!   pairing key survives restarts.
//! - Providing sensible defaults when the file does not exist yet (first run).
//!
//! The [`config::ConfigStore`] trait lets the session controller persist the
//! record without knowing about files; tests use the in-memory store.

pub mod config;
