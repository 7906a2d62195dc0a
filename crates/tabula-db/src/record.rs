//! Table-bound records and the repository that persists them through
//! undoable commands.
//!
//! A [`Record`] only accepts keys its [`TableDef`] declares; every get and set
//! is checked and unknown keys fail with [`Error::UnknownColumn`]. Persistence
//! goes through a [`Session`], which pairs the borrowed connection with the
//! [`CommandInvoker`] that records each save and delete for undo.

use std::fmt;

use rusqlite::types::Value;
use rusqlite::Connection;
use tabula_core::{Error, Result};

use crate::command::{
    Command, CommandPayload, CreateCommand, DeleteCommand, Outcome, UpdateCommand,
};
use crate::invoker::CommandInvoker;
use crate::query::{QueryBuilder, Selection};
use crate::schema::TableDef;

/// Column values for one row of a [`TableDef`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record<'t> {
    table: &'t TableDef,
    // Aligned with `table.columns()`; `None` means never assigned.
    values: Vec<Option<Value>>,
}

impl<'t> Record<'t> {
    pub fn new(table: &'t TableDef) -> Self {
        Self {
            table,
            values: vec![None; table.columns().len()],
        }
    }

    /// Build a record from `(column, value)` pairs, rejecting unknown columns.
    pub fn from_pairs<K, V>(table: &'t TableDef, pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = Self::new(table);
        for (key, value) in pairs {
            record.set(key.as_ref(), value)?;
        }
        Ok(record)
    }

    /// Builder-style [`Record::set`].
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(key, value)?;
        Ok(self)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let idx = self.index_of(key)?;
        self.values[idx] = Some(value.into());
        Ok(())
    }

    /// Value of `key`, or `None` if it was never assigned.
    pub fn get(&self, key: &str) -> Result<Option<&Value>> {
        let idx = self.index_of(key)?;
        Ok(self.values[idx].as_ref())
    }

    pub fn table(&self) -> &'t TableDef {
        self.table
    }

    /// Integer primary-key value, once the row exists in the store.
    pub fn id(&self) -> Option<i64> {
        match self.get(self.table.primary_key()) {
            Ok(Some(Value::Integer(id))) => Some(*id),
            _ => None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    /// Assigned `(column, value)` pairs in declared column order.
    pub fn assigned(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.table
            .columns()
            .iter()
            .zip(&self.values)
            .filter_map(|(col, value)| value.as_ref().map(|v| (col.name.as_str(), v)))
    }

    /// Assigned values as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .assigned()
            .map(|(k, v)| (k.to_string(), value_to_json(v)))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }

    fn index_of(&self, key: &str) -> Result<usize> {
        self.table
            .columns()
            .iter()
            .position(|c| c.name == key)
            .ok_or_else(|| Error::unknown_column(self.table.name(), key))
    }
}

impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.table.name())?;
        for (i, (key, value)) in self.assigned().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={}", display_value(value))?;
        }
        f.write_str(")")
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => format!("'{s}'"),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Real(r) => serde_json::Value::from(*r),
        Value::Text(s) => serde_json::Value::from(s.as_str()),
        Value::Blob(b) => serde_json::Value::from(b.clone()),
    }
}

/// Execution context threaded through repository calls: the connection the
/// commands run on and the invoker that keeps their undo history.
#[derive(Debug)]
pub struct Session<'c> {
    conn: &'c Connection,
    invoker: CommandInvoker<'c>,
}

impl<'c> Session<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            invoker: CommandInvoker::new(),
        }
    }

    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    pub fn invoker(&self) -> &CommandInvoker<'c> {
        &self.invoker
    }

    /// Run a command through this session's invoker.
    pub fn execute<C>(&mut self, command: C) -> Result<Outcome>
    where
        C: Command + 'c,
    {
        self.invoker.execute_command(command)
    }

    /// Undo the most recent command run in this session.
    pub fn undo_last(&mut self) -> Result<bool> {
        self.invoker.undo_last()
    }
}

/// Saves, deletes and queries records of one table.
#[derive(Debug, Clone, Copy)]
pub struct Repository<'t> {
    table: &'t TableDef,
}

impl<'t> Repository<'t> {
    pub fn new(table: &'t TableDef) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'t TableDef {
        self.table
    }

    /// Insert a new record, or update an existing one keyed by its primary key.
    ///
    /// On insert the assigned identifier is written back into `record`.
    pub fn save(&self, session: &mut Session<'_>, record: &mut Record<'t>) -> Result<()> {
        self.check_owner(record)?;
        let pk = self.table.primary_key();
        let (fields, values): (Vec<String>, Vec<Value>) = record
            .assigned()
            .filter(|(k, _)| *k != pk)
            .map(|(k, v)| (k.to_string(), v.clone()))
            .unzip();
        let payload = CommandPayload::new(self.table.name())
            .fields(fields)
            .values(values);

        match record.id() {
            None => {
                let conn = session.connection();
                let outcome = session.execute(CreateCommand::new(conn, payload))?;
                if let Some(id) = outcome.created_id() {
                    record.set(pk, id)?;
                }
            }
            Some(id) => {
                let conn = session.connection();
                let payload = payload.condition(format!("{pk} = {id}"));
                session.execute(UpdateCommand::new(conn, payload))?;
            }
        }
        Ok(())
    }

    /// Delete a stored record. The record is consumed; a record that was
    /// never saved has no identifier and is rejected.
    pub fn delete(&self, session: &mut Session<'_>, record: Record<'t>) -> Result<()> {
        self.check_owner(&record)?;
        let Some(id) = record.id() else {
            return Err(Error::contract(format!(
                "cannot delete a {} record without an identifier",
                self.table.name()
            )));
        };

        let conn = session.connection();
        let payload = CommandPayload::new(self.table.name())
            .condition(format!("{} = {id}", self.table.primary_key()));
        session.execute(DeleteCommand::new(conn, payload))?;
        Ok(())
    }

    /// Start a query. An empty field list, or `["*"]`, selects every column.
    pub fn select<'s, 'c>(
        &self,
        session: &'s mut Session<'c>,
        fields: &[&str],
    ) -> QueryBuilder<'s, 't, 'c> {
        QueryBuilder::new(self.table, session, Selection::from_fields(fields))
    }

    fn check_owner(&self, record: &Record<'_>) -> Result<()> {
        if record.table().name() == self.table.name() {
            Ok(())
        } else {
            Err(Error::contract(format!(
                "record of '{}' passed to the '{}' repository",
                record.table().name(),
                self.table.name()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;

    fn users() -> TableDef {
        TableDef::new("users")
            .column(Column::integer("id").primary_key())
            .column(Column::string("name", 50).not_null())
            .column(Column::string("email", 100).not_null())
    }

    fn conn(table: &TableDef) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&table.create_sql()).unwrap();
        conn
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let table = users();
        let mut record = Record::new(&table);
        assert!(matches!(
            record.set("age", 3),
            Err(Error::UnknownColumn { .. })
        ));
        assert!(matches!(record.get("age"), Err(Error::UnknownColumn { .. })));
        assert!(Record::from_pairs(&table, [("nick", text("x"))]).is_err());
    }

    #[test]
    fn get_distinguishes_unset_from_null() {
        let table = users();
        let record = Record::new(&table).with("email", Value::Null).unwrap();
        assert_eq!(record.get("name").unwrap(), None);
        assert_eq!(record.get("email").unwrap(), Some(&Value::Null));
    }

    #[test]
    fn display_and_json() {
        let table = users();
        let record = Record::from_pairs(&table, [("id", Value::Integer(3)), ("name", text("Ala"))])
            .unwrap();
        assert_eq!(record.to_string(), "users(id=3, name='Ala')");
        assert_eq!(record.to_json(), serde_json::json!({"id": 3, "name": "Ala"}));
        assert_eq!(record.id(), Some(3));
        assert!(!record.is_new());
    }

    #[test]
    fn save_inserts_then_updates() {
        let table = users();
        let conn = conn(&table);
        let repo = Repository::new(&table);
        let mut session = Session::new(&conn);

        let mut ala = Record::new(&table)
            .with("name", text("Ala"))
            .unwrap()
            .with("email", text("a@a.com"))
            .unwrap();
        assert!(ala.is_new());
        repo.save(&mut session, &mut ala).unwrap();
        assert_eq!(ala.id(), Some(1));

        ala.set("email", text("alice@gmail.com")).unwrap();
        repo.save(&mut session, &mut ala).unwrap();

        let email: String = conn
            .query_row("SELECT email FROM users WHERE id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(email, "alice@gmail.com");
        assert_eq!(session.invoker().len(), 2);

        session.undo_last().unwrap();
        let email: String = conn
            .query_row("SELECT email FROM users WHERE id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(email, "a@a.com");
    }

    #[test]
    fn delete_requires_identifier() {
        let table = users();
        let conn = conn(&table);
        let repo = Repository::new(&table);
        let mut session = Session::new(&conn);

        let unsaved = Record::new(&table).with("name", text("Ghost")).unwrap();
        let err = repo.delete(&mut session, unsaved).unwrap_err();
        assert!(matches!(err, Error::Contract(_)));
        assert!(session.invoker().is_empty());
    }

    #[test]
    fn delete_then_undo_restores_row() {
        let table = users();
        let conn = conn(&table);
        let repo = Repository::new(&table);
        let mut session = Session::new(&conn);

        let mut ewa =
            Record::from_pairs(&table, [("name", text("Ewa")), ("email", text("w@w.com"))])
                .unwrap();
        repo.save(&mut session, &mut ewa).unwrap();
        let id = ewa.id().unwrap();

        repo.delete(&mut session, ewa).unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 0);

        session.undo_last().unwrap();
        let name: String = conn
            .query_row("SELECT name FROM users WHERE id = ?1", [id], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "Ewa");
    }

    #[test]
    fn foreign_record_is_rejected() {
        let table = users();
        let other = TableDef::new("posts").column(Column::integer("id").primary_key());
        let conn = conn(&table);
        let repo = Repository::new(&table);
        let mut session = Session::new(&conn);

        let post = Record::new(&other).with("id", 1).unwrap();
        assert!(matches!(
            repo.delete(&mut session, post),
            Err(Error::Contract(_))
        ));
    }
}
