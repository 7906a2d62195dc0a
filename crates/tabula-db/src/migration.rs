//! Named migrations tracked in a `migrations` table.
//!
//! A migration's SQL and the row recording its name commit together in one
//! transaction on a single pooled connection, so a migration is recorded if
//! and only if every statement in it ran. Applying the same name again is a
//! no-op.

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::Connection;
use tabula_core::{Error, Result};

use crate::store::Store;

const CREATE_MIGRATIONS: &str = "CREATE TABLE IF NOT EXISTS migrations (
    id         INTEGER PRIMARY KEY,
    name       TEXT UNIQUE NOT NULL,
    applied_at TEXT NOT NULL
)";

/// Applies and lists migrations against one store.
#[derive(Debug, Clone, Copy)]
pub struct Migrator<'s> {
    store: &'s Store,
}

impl<'s> Migrator<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    pub fn create_migrations_table(&self) -> Result<()> {
        self.store.execute_query(CREATE_MIGRATIONS, &[])?;
        Ok(())
    }

    /// Run `sql` and record `name`. Returns `false` if `name` was already applied.
    pub fn apply(&self, name: &str, sql: &str) -> Result<bool> {
        let conn = self.store.connect()?;
        let result = apply_on(&conn, name, sql);
        self.store.release(conn);
        result
    }

    pub fn is_applied(&self, name: &str) -> Result<bool> {
        let rows = self.store.execute_query(
            "SELECT COUNT(*) FROM migrations WHERE name = ?1",
            &[Value::Text(name.to_string())],
        )?;
        Ok(matches!(rows.first().and_then(|r| r.first()), Some(Value::Integer(n)) if *n > 0))
    }

    /// Applied migration names, oldest first.
    pub fn applied(&self) -> Result<Vec<String>> {
        self.create_migrations_table()?;
        let rows = self
            .store
            .execute_query("SELECT name FROM migrations ORDER BY id", &[])?;
        rows.into_iter()
            .map(|row| match row.into_iter().next() {
                Some(Value::Text(name)) => Ok(name),
                other => Err(Error::contract(format!(
                    "unexpected migration name value: {other:?}"
                ))),
            })
            .collect()
    }

    /// Whether `table` declares `column`, probed via `PRAGMA table_info`.
    pub fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        let rows = self
            .store
            .execute_query(&format!("PRAGMA table_info({table})"), &[])?;
        Ok(rows
            .iter()
            .any(|row| matches!(row.get(1), Some(Value::Text(name)) if name == column)))
    }
}

fn apply_on(conn: &Connection, name: &str, sql: &str) -> Result<bool> {
    conn.execute_batch(CREATE_MIGRATIONS)
        .map_err(|e| Error::statement(CREATE_MIGRATIONS, e))?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::statement("BEGIN", e))?;
    let exists: i64 = tx
        .query_row(
            "SELECT COUNT(*) FROM migrations WHERE name = ?1",
            [name],
            |row| row.get(0),
        )
        .map_err(|e| Error::statement("SELECT COUNT(*) FROM migrations", e))?;
    if exists > 0 {
        tracing::debug!("Migration {name} already applied");
        return Ok(false);
    }

    tx.execute_batch(sql).map_err(|e| Error::statement(sql, e))?;
    tx.execute(
        "INSERT INTO migrations (name, applied_at) VALUES (?1, ?2)",
        (name, Utc::now().to_rfc3339()),
    )
    .map_err(|e| Error::statement("INSERT INTO migrations", e))?;
    tx.commit().map_err(|e| Error::statement("COMMIT", e))?;

    tracing::info!("Applied migration {name}");
    Ok(true)
}
