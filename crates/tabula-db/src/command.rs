//! Undoable CRUD commands.
//!
//! Each command borrows a connection and owns a [`CommandPayload`]. Running
//! [`Command::execute`] performs the forward statement and returns the
//! caller-facing [`Outcome`] together with an [`Executed`] record holding
//! whatever pre-state is needed to reverse it. Handing that record back to
//! [`Command::undo`] replays the pre-state. Commands themselves carry no
//! mutable state between the two calls.
//!
//! Undo is a compensating statement, not a rollback: it is only meaningful
//! for the record produced by the immediately preceding execution of that
//! command.

use rusqlite::types::Value;
use rusqlite::Connection;
use tabula_core::{Error, Result};

use crate::rows::{self, placeholders, RowSet};

/// Table, columns, values and predicate a command operates on.
///
/// `fields` and `values` pair up positionally for Create and Update. A length
/// mismatch is not checked here and surfaces as a statement error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandPayload {
    pub table: String,
    pub fields: Vec<String>,
    pub values: Vec<Value>,
    pub condition: Option<String>,
}

impl CommandPayload {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    fn select_list(&self) -> String {
        if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        }
    }

    fn where_clause(&self) -> String {
        match &self.condition {
            Some(c) => format!(" WHERE {c}"),
            None => String::new(),
        }
    }

    fn required_condition(&self, kind: CommandKind) -> Result<&str> {
        match self.condition.as_deref() {
            Some(c) if !c.trim().is_empty() => Ok(c),
            _ => Err(Error::contract(format!(
                "{kind} on '{}' requires a condition",
                self.table
            ))),
        }
    }
}

/// The four command variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CommandKind::Create => "create",
            CommandKind::Read => "read",
            CommandKind::Update => "update",
            CommandKind::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// What an executed command hands back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Identifier assigned to the inserted row.
    Created(i64),
    /// Rows returned by a read.
    Rows(RowSet),
    /// Number of rows an update changed.
    Updated(usize),
    /// Number of rows a delete removed.
    Deleted(usize),
}

impl Outcome {
    pub fn created_id(&self) -> Option<i64> {
        match self {
            Outcome::Created(id) => Some(*id),
            _ => None,
        }
    }

    pub fn into_rows(self) -> Option<RowSet> {
        match self {
            Outcome::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Rows touched by a mutating command.
    pub fn affected(&self) -> usize {
        match self {
            Outcome::Created(_) => 1,
            Outcome::Rows(_) => 0,
            Outcome::Updated(n) | Outcome::Deleted(n) => *n,
        }
    }
}

/// Pre-state captured by an execution, consumed by the matching undo.
#[derive(Debug, Clone, PartialEq)]
pub enum Executed {
    /// `id` is `None` when the insert added no row.
    Create { id: Option<i64> },
    Read,
    /// Each row is `rowid` followed by the payload fields' prior values.
    Update { pre_image: RowSet },
    /// Full rows, in the column order of `columns`.
    Delete {
        columns: Vec<String>,
        pre_image: RowSet,
    },
}

/// An operation that can be executed and later compensated.
pub trait Command {
    fn kind(&self) -> CommandKind;

    fn payload(&self) -> &CommandPayload;

    /// Run the forward statement.
    fn execute(&self) -> Result<(Outcome, Executed)>;

    /// Reverse the effect recorded in `executed`.
    fn undo(&self, executed: Executed) -> Result<()>;
}

/// INSERT one row; undo deletes it again.
pub struct CreateCommand<'c> {
    conn: &'c Connection,
    payload: CommandPayload,
}

impl<'c> CreateCommand<'c> {
    pub fn new(conn: &'c Connection, payload: CommandPayload) -> Self {
        Self { conn, payload }
    }
}

impl Command for CreateCommand<'_> {
    fn kind(&self) -> CommandKind {
        CommandKind::Create
    }

    fn payload(&self) -> &CommandPayload {
        &self.payload
    }

    fn execute(&self) -> Result<(Outcome, Executed)> {
        let p = &self.payload;
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            p.table,
            p.fields.join(", "),
            placeholders(p.fields.len())
        );

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| Error::statement("BEGIN", e))?;
        let inserted = rows::execute(&tx, &sql, &p.values)?;
        let id = (inserted > 0).then(|| tx.last_insert_rowid());
        tx.commit().map_err(|e| Error::statement("COMMIT", e))?;

        tracing::debug!(table = %p.table, ?id, "created row");
        Ok((Outcome::Created(id.unwrap_or(0)), Executed::Create { id }))
    }

    fn undo(&self, executed: Executed) -> Result<()> {
        let Executed::Create { id: Some(id) } = executed else {
            return Ok(());
        };
        let sql = format!("DELETE FROM {} WHERE rowid = ?", self.payload.table);
        rows::execute(self.conn, &sql, &[Value::Integer(id)])?;
        tracing::debug!(table = %self.payload.table, id, "undid create");
        Ok(())
    }
}

/// SELECT rows; never undoable.
pub struct ReadCommand<'c> {
    conn: &'c Connection,
    payload: CommandPayload,
}

impl<'c> ReadCommand<'c> {
    pub fn new(conn: &'c Connection, payload: CommandPayload) -> Self {
        Self { conn, payload }
    }
}

impl Command for ReadCommand<'_> {
    fn kind(&self) -> CommandKind {
        CommandKind::Read
    }

    fn payload(&self) -> &CommandPayload {
        &self.payload
    }

    fn execute(&self) -> Result<(Outcome, Executed)> {
        let p = &self.payload;
        let sql = format!("SELECT {} FROM {}{}", p.select_list(), p.table, p.where_clause());
        let rows = rows::query(self.conn, &sql, &[])?;
        Ok((Outcome::Rows(rows), Executed::Read))
    }

    fn undo(&self, _executed: Executed) -> Result<()> {
        Ok(())
    }
}

/// UPDATE matching rows; undo writes their captured prior values back.
pub struct UpdateCommand<'c> {
    conn: &'c Connection,
    payload: CommandPayload,
}

impl<'c> UpdateCommand<'c> {
    pub fn new(conn: &'c Connection, payload: CommandPayload) -> Self {
        Self { conn, payload }
    }

    fn set_clause(&self) -> String {
        self.payload
            .fields
            .iter()
            .map(|f| format!("{f} = ?"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Command for UpdateCommand<'_> {
    fn kind(&self) -> CommandKind {
        CommandKind::Update
    }

    fn payload(&self) -> &CommandPayload {
        &self.payload
    }

    fn execute(&self) -> Result<(Outcome, Executed)> {
        let p = &self.payload;
        let condition = p.required_condition(self.kind())?;

        // Pre-image rows are keyed by rowid, not by the condition, so the
        // rowid itself must stay fixed.
        let rowid_names = rows::rowid_names(self.conn, &p.table)?;
        if let Some(field) = p
            .fields
            .iter()
            .find(|f| rowid_names.iter().any(|r| r.eq_ignore_ascii_case(f.trim())))
        {
            return Err(Error::contract(format!(
                "update on '{}' cannot change row identifier '{field}'",
                p.table
            )));
        }

        let capture = format!(
            "SELECT rowid, {} FROM {} WHERE {condition}",
            p.fields.join(", "),
            p.table
        );
        let update = format!("UPDATE {} SET {} WHERE {condition}", p.table, self.set_clause());

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| Error::statement("BEGIN", e))?;
        let pre_image = rows::query(&tx, &capture, &[])?;
        let changed = rows::execute(&tx, &update, &p.values)?;
        tx.commit().map_err(|e| Error::statement("COMMIT", e))?;

        tracing::debug!(table = %p.table, changed, "updated rows");
        Ok((Outcome::Updated(changed), Executed::Update { pre_image }))
    }

    fn undo(&self, executed: Executed) -> Result<()> {
        let Executed::Update { pre_image } = executed else {
            return Ok(());
        };
        if pre_image.is_empty() {
            return Ok(());
        }

        let restore = format!(
            "UPDATE {} SET {} WHERE rowid = ?",
            self.payload.table,
            self.set_clause()
        );
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| Error::statement("BEGIN", e))?;
        for row in &pre_image {
            let Some((rowid, prior)) = row.split_first() else {
                continue;
            };
            let mut params = prior.to_vec();
            params.push(rowid.clone());
            rows::execute(&tx, &restore, &params)?;
        }
        tx.commit().map_err(|e| Error::statement("COMMIT", e))?;

        tracing::debug!(table = %self.payload.table, rows = pre_image.len(), "undid update");
        Ok(())
    }
}

/// DELETE matching rows; undo re-inserts the captured rows.
pub struct DeleteCommand<'c> {
    conn: &'c Connection,
    payload: CommandPayload,
}

impl<'c> DeleteCommand<'c> {
    pub fn new(conn: &'c Connection, payload: CommandPayload) -> Self {
        Self { conn, payload }
    }
}

impl Command for DeleteCommand<'_> {
    fn kind(&self) -> CommandKind {
        CommandKind::Delete
    }

    fn payload(&self) -> &CommandPayload {
        &self.payload
    }

    fn execute(&self) -> Result<(Outcome, Executed)> {
        let p = &self.payload;
        let condition = p.required_condition(self.kind())?;
        let capture = format!("SELECT * FROM {} WHERE {condition}", p.table);
        let delete = format!("DELETE FROM {} WHERE {condition}", p.table);

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| Error::statement("BEGIN", e))?;
        let columns = rows::column_names(&tx, &p.table)?;
        let pre_image = rows::query(&tx, &capture, &[])?;
        let removed = rows::execute(&tx, &delete, &[])?;
        tx.commit().map_err(|e| Error::statement("COMMIT", e))?;

        tracing::debug!(table = %p.table, removed, "deleted rows");
        Ok((
            Outcome::Deleted(removed),
            Executed::Delete { columns, pre_image },
        ))
    }

    fn undo(&self, executed: Executed) -> Result<()> {
        let Executed::Delete { columns, pre_image } = executed else {
            return Ok(());
        };
        if pre_image.is_empty() {
            return Ok(());
        }

        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.payload.table,
            columns.join(", "),
            placeholders(columns.len())
        );
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| Error::statement("BEGIN", e))?;
        for row in &pre_image {
            rows::execute(&tx, &insert, row)?;
        }
        tx.commit().map_err(|e| Error::statement("COMMIT", e))?;

        tracing::debug!(table = %self.payload.table, rows = pre_image.len(), "undid delete");
        Ok(())
    }
}
