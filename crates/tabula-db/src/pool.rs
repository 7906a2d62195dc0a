//! Connection pool management for SQLite via r2d2.
//!
//! The pool opens its full complement of connections when it is configured
//! and never grows, shrinks or recycles them afterwards. Checkout is
//! non-blocking: when every connection is in use, [`ConnectionPool::acquire`]
//! fails straight away with [`Error::PoolExhausted`].

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tabula_core::{Error, Result, StoreConfig};

/// A live store session checked out of a [`ConnectionPool`].
///
/// Dereferences to [`rusqlite::Connection`]. Dropping the handle returns it to
/// the pool, so a handle can be released at most once.
pub type ConnectionHandle = r2d2::PooledConnection<SqliteConnectionManager>;

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Connections ready to be acquired.
    pub available: u32,
    /// Connections currently held by callers.
    pub checked_out: u32,
    /// Configured pool size.
    pub max_connections: u32,
}

/// Fixed-size pool of SQLite connections.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Pool<SqliteConnectionManager>,
    max_connections: u32,
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("status", &self.status())
            .finish()
    }
}

impl ConnectionPool {
    /// Open `max_connections` connections to the database file at `location`.
    ///
    /// Fails with [`Error::Configuration`] when `location` is empty or the
    /// size is zero, and with [`Error::Connection`] when the file cannot be
    /// opened.
    pub fn configure(location: &str, max_connections: u32) -> Result<Self> {
        Self::from_config(&StoreConfig::new(location).with_max_connections(max_connections))
    }

    /// Build a pool from a validated [`StoreConfig`].
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let manager = SqliteConnectionManager::file(&config.location).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA journal_mode = WAL;
                 PRAGMA busy_timeout = 5000;",
            )
        });

        let pool = Self::build(manager, config)?;
        tracing::info!(
            "Configured pool of {} connections for {}",
            config.max_connections,
            config.location
        );
        Ok(pool)
    }

    /// Open a pool over a private in-memory database.
    ///
    /// Each call creates a uniquely-named shared-cache database so that
    /// parallel tests do not interfere with each other, while all connections
    /// within a single pool still share state.
    pub fn configure_in_memory(max_connections: u32) -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let uri = format!("file:tabula_mem_{}_{n}?mode=memory&cache=shared", std::process::id());

        let config = StoreConfig::new(uri).with_max_connections(max_connections);
        config.validate()?;

        let manager = SqliteConnectionManager::file(&config.location).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )
        });

        Self::build(manager, &config)
    }

    fn build(manager: SqliteConnectionManager, config: &StoreConfig) -> Result<Self> {
        // min_idle == max_size makes the builder open every connection up
        // front; no lifetime or idle limits keeps that set fixed afterwards.
        let inner = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(config.max_connections))
            .max_lifetime(None)
            .idle_timeout(None)
            .connection_timeout(config.connection_timeout())
            .build(manager)
            .map_err(|e| Error::connection(format!("Failed to open {}: {e}", config.location)))?;

        Ok(Self {
            inner,
            max_connections: config.max_connections,
        })
    }

    /// Take an available connection without waiting.
    pub fn acquire(&self) -> Result<ConnectionHandle> {
        match self.inner.try_get() {
            Some(conn) => {
                tracing::trace!("Acquired connection ({:?})", self.status());
                Ok(conn)
            }
            None => {
                tracing::debug!("Pool exhausted at {} connections", self.max_connections);
                Err(Error::PoolExhausted {
                    max: self.max_connections,
                })
            }
        }
    }

    /// Return a connection to the available set.
    pub fn release(&self, handle: ConnectionHandle) {
        drop(handle);
        tracing::trace!("Released connection ({:?})", self.status());
    }

    /// Current occupancy.
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state();
        PoolStatus {
            available: state.idle_connections,
            checked_out: state.connections - state.idle_connections,
            max_connections: self.max_connections,
        }
    }

    /// Configured pool size.
    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }
}
