//! Tabula - pooled SQLite access with undoable CRUD commands
//!
//! This library crate exposes the binary's configuration and demo modules
//! for integration testing.

pub mod config;
pub mod demo;
