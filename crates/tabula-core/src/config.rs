//! Store configuration.
//!
//! [`StoreConfig`] is deserialized from TOML. Every field has a default, so an
//! empty document is valid input, but [`StoreConfig::validate`] still rejects
//! an empty location before any connection is opened.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Connection settings for a single store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the SQLite database file.
    pub location: String,
    /// Number of connections opened eagerly when the pool is configured.
    pub max_connections: u32,
    /// How long configuration waits for all connections to open.
    pub connection_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: "tabula.db".to_string(),
            max_connections: 5,
            connection_timeout_secs: 5,
        }
    }
}

impl StoreConfig {
    /// Config for `location` with default pool settings.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
        }
    }

    /// Set the pool size.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Deserialize a `StoreConfig` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| Error::configuration(format!("config parse error: {e}")))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        tracing::debug!("Loaded store config from {}", path.display());
        Self::from_toml(&contents)
    }

    /// Connection-open timeout as a [`Duration`].
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Reject settings no pool can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.location.trim().is_empty() {
            return Err(Error::configuration("store location cannot be empty"));
        }
        if self.max_connections == 0 {
            return Err(Error::configuration("max_connections must be at least 1"));
        }
        if self.connection_timeout_secs == 0 {
            return Err(Error::configuration(
                "connection_timeout_secs must be at least 1",
            ));
        }
        Ok(())
    }
}
