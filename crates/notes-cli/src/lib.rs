//! notes-cli library: exposes the binary's modules for testing.
//!
//! This is a thin library layer over the command handlers,
//! allowing integration tests to drive them against a real file store.

pub mod commands;
pub mod config;
pub mod json_store;

// Re-export key types for convenience
pub use commands::CommandError;
pub use config::Config;
pub use json_store::JsonFileStore;
