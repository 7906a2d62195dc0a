//! Store facade: pool configuration plus a scoped "acquire, run, release"
//! path for callers that do not need undo tracking (schema and migration
//! helpers mostly).

use rusqlite::types::Value;
use rusqlite::Connection;
use tabula_core::{Error, Result, StoreConfig};

use crate::pool::{ConnectionHandle, ConnectionPool, PoolStatus};
use crate::rows::{self, RowSet};

/// A configured store and its connection pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: ConnectionPool,
}

impl Store {
    /// Configure a store backed by the database file at `location`.
    pub fn configure(location: &str, max_connections: u32) -> Result<Self> {
        Ok(Self {
            pool: ConnectionPool::configure(location, max_connections)?,
        })
    }

    /// Configure a store from a [`StoreConfig`].
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Ok(Self {
            pool: ConnectionPool::from_config(config)?,
        })
    }

    /// Configure a store over a private in-memory database (useful for tests).
    pub fn in_memory(max_connections: u32) -> Result<Self> {
        Ok(Self {
            pool: ConnectionPool::configure_in_memory(max_connections)?,
        })
    }

    /// Check a connection out of the pool.
    pub fn connect(&self) -> Result<ConnectionHandle> {
        self.pool.acquire()
    }

    /// Give a connection obtained from [`Store::connect`] back.
    pub fn release(&self, handle: ConnectionHandle) {
        self.pool.release(handle);
    }

    /// Current pool occupancy.
    pub fn status(&self) -> PoolStatus {
        self.pool.status()
    }

    /// The underlying pool.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Run one statement on a pooled connection.
    ///
    /// The connection is returned to the pool on every exit path. A failure
    /// reporting that the target object already exists is logged and
    /// swallowed so that schema statements can be re-run; any other error
    /// is returned unchanged.
    pub fn execute_query(&self, sql: &str, params: &[Value]) -> Result<RowSet> {
        let conn = self.connect()?;
        let result = rows::run(&conn, sql, params);
        self.release(conn);
        suppress_already_exists(result)
    }

    /// Run a batch of semicolon-separated statements on a pooled connection.
    ///
    /// The batch runs in one transaction: either every statement takes effect
    /// or none does. Failures are never suppressed here, since SQLite stops a
    /// batch at its first error and the remaining statements would be lost.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.connect()?;
        let result = run_batch(&conn, sql);
        self.release(conn);
        result
    }
}

fn run_batch(conn: &Connection, sql: &str) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::statement("BEGIN", e))?;
    tx.execute_batch(sql).map_err(|e| Error::statement(sql, e))?;
    tx.commit().map_err(|e| Error::statement("COMMIT", e))
}

fn suppress_already_exists<T: Default>(result: Result<T>) -> Result<T> {
    match result {
        Err(e) if e.is_already_exists() => {
            tracing::warn!("Ignoring statement failure: {e}");
            Ok(T::default())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_query_round_trip() {
        let store = Store::in_memory(2).unwrap();
        store
            .execute_query("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)", &[])
            .unwrap();
        store
            .execute_query(
                "INSERT INTO notes (body) VALUES (?)",
                &[Value::Text("hello".into())],
            )
            .unwrap();

        let rows = store.execute_query("SELECT id, body FROM notes", &[]).unwrap();
        assert_eq!(rows, vec![vec![Value::Integer(1), Value::Text("hello".into())]]);
    }

    #[test]
    fn duplicate_create_is_suppressed() {
        let store = Store::in_memory(1).unwrap();
        let ddl = "CREATE TABLE notes (id INTEGER PRIMARY KEY)";
        store.execute_query(ddl, &[]).unwrap();
        assert!(store.execute_query(ddl, &[]).unwrap().is_empty());
    }

    #[test]
    fn batch_failure_is_reported_and_rolled_back() {
        let store = Store::in_memory(1).unwrap();
        store
            .execute_query("CREATE TABLE notes (id INTEGER PRIMARY KEY)", &[])
            .unwrap();

        let err = store
            .execute_batch(
                "CREATE TABLE tags (id INTEGER PRIMARY KEY);
                 CREATE TABLE notes (id INTEGER PRIMARY KEY);
                 CREATE TABLE links (id INTEGER PRIMARY KEY);",
            )
            .unwrap_err();
        assert!(err.is_already_exists());

        let tables = store
            .execute_query(
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                &[],
            )
            .unwrap();
        assert_eq!(tables, vec![vec![Value::Text("notes".into())]]);
        assert_eq!(store.status().available, 1);
    }

    #[test]
    fn other_failures_propagate_and_release() {
        let store = Store::in_memory(1).unwrap();
        let err = store.execute_query("SELECT * FROM missing", &[]).unwrap_err();
        assert!(matches!(err, Error::Statement { .. }));

        // The single connection came back despite the failure.
        assert_eq!(store.status().available, 1);
        assert!(store.connect().is_ok());
    }

    #[test]
    fn execute_query_reports_exhaustion() {
        let store = Store::in_memory(1).unwrap();
        let held = store.connect().unwrap();
        let err = store.execute_query("SELECT 1", &[]).unwrap_err();
        assert!(matches!(err, Error::PoolExhausted { max: 1 }));
        store.release(held);
        assert!(store.execute_query("SELECT 1", &[]).is_ok());
    }

    #[test]
    fn configure_rejects_empty_location() {
        assert!(matches!(
            Store::configure("", 5),
            Err(Error::Configuration(_))
        ));
    }
}
