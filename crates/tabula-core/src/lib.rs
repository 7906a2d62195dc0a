//! tabula-core: shared error type and store configuration.
//!
//! This crate is the foundational dependency for the other tabula crates,
//! providing the unified [`Error`] type, its [`Result`] alias, and the
//! [`StoreConfig`] consumed when a connection pool is configured.

pub mod config;
pub mod error;

// Re-export the most commonly used items at the crate root.
pub use config::StoreConfig;
pub use error::{Error, Result};
