//! Row sets and the small statement helpers every command is built from.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tabula_core::{Error, Result};

/// One result row, in select-list order.
pub type Row = Vec<Value>;

/// All rows returned by a query.
pub type RowSet = Vec<Row>;

/// Run a query and collect every row.
pub(crate) fn query(conn: &Connection, sql: &str, params: &[Value]) -> Result<RowSet> {
    tracing::debug!(sql, params = params.len(), "query");
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| Error::statement(sql, e))?;
    let width = stmt.column_count();
    let rows = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Row>>()
        })
        .map_err(|e| Error::statement(sql, e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::statement(sql, e))?;
    Ok(rows)
}

/// Run a statement that returns no rows; yields the number of rows changed.
pub(crate) fn execute(conn: &Connection, sql: &str, params: &[Value]) -> Result<usize> {
    tracing::debug!(sql, params = params.len(), "execute");
    conn.execute(sql, params_from_iter(params.iter()))
        .map_err(|e| Error::statement(sql, e))
}

/// Run any statement: rows are collected when it produces a result set.
pub(crate) fn run(conn: &Connection, sql: &str, params: &[Value]) -> Result<RowSet> {
    let returns_rows = conn
        .prepare(sql)
        .map_err(|e| Error::statement(sql, e))?
        .column_count()
        > 0;
    if returns_rows {
        query(conn, sql, params)
    } else {
        execute(conn, sql, params).map(|_| Vec::new())
    }
}

/// Column names of `table` in declared order, read from a zero-row probe.
pub(crate) fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let sql = format!("SELECT * FROM {table} LIMIT 0");
    let stmt = conn
        .prepare(&sql)
        .map_err(|e| Error::statement(&sql, e))?;
    Ok(stmt.column_names().into_iter().map(String::from).collect())
}

/// Names through which an UPDATE can rewrite the rowid of `table`: the
/// built-in aliases plus a lone `INTEGER PRIMARY KEY` column, if declared.
pub(crate) fn rowid_names(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let info = query(conn, &format!("PRAGMA table_info({table})"), &[])?;
    let keys: Vec<&Row> = info
        .iter()
        .filter(|row| matches!(row.get(5), Some(Value::Integer(pk)) if *pk > 0))
        .collect();

    let mut names: Vec<String> = ["rowid", "oid", "_rowid_"].map(String::from).to_vec();
    if let [key] = keys.as_slice() {
        if let (Some(Value::Text(name)), Some(Value::Text(ty))) = (key.get(1), key.get(2)) {
            if ty.eq_ignore_ascii_case("INTEGER") {
                names.push(name.clone());
            }
        }
    }
    Ok(names)
}

/// Comma-separated `?` placeholders.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
