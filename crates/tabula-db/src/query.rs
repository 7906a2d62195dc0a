//! Fluent read queries over a [`TableDef`].
//!
//! Conditions accumulate with [`QueryBuilder::filter`] and are ANDed together.
//! Nothing touches the store until [`QueryBuilder::execute`], which is also
//! when an all-columns selection is resolved against the table definition.

use tabula_core::{Error, Result};

use crate::command::{CommandPayload, ReadCommand};
use crate::record::{Record, Session};
use crate::schema::TableDef;

/// Which columns a query returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every declared column, resolved at execute time. The builder holds a
    /// shared borrow of the [`TableDef`], so its columns cannot change
    /// between building a query and running it.
    All,
    Fields(Vec<String>),
}

impl Selection {
    /// An empty list or a lone `*` selects everything.
    pub fn from_fields(fields: &[&str]) -> Self {
        match fields {
            [] | ["*"] => Selection::All,
            _ => Selection::Fields(fields.iter().map(|f| f.to_string()).collect()),
        }
    }

    fn resolve(&self, table: &TableDef) -> Vec<String> {
        match self {
            Selection::All => table.column_names(),
            Selection::Fields(fields) => fields.clone(),
        }
    }
}

/// A pending read bound to a table and a session.
#[derive(Debug)]
pub struct QueryBuilder<'s, 't, 'c> {
    table: &'t TableDef,
    session: &'s mut Session<'c>,
    selection: Selection,
    conditions: Vec<String>,
}

impl<'s, 't, 'c> QueryBuilder<'s, 't, 'c> {
    pub fn new(table: &'t TableDef, session: &'s mut Session<'c>, selection: Selection) -> Self {
        Self {
            table,
            session,
            selection,
            conditions: Vec::new(),
        }
    }

    /// Add a condition; all conditions must hold.
    pub fn filter(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// The WHERE predicate the query will run with.
    pub fn condition(&self) -> String {
        match self.conditions.as_slice() {
            [] => "1=1".to_string(),
            [only] => only.clone(),
            many => many
                .iter()
                .map(|c| format!("({c})"))
                .collect::<Vec<_>>()
                .join(" AND "),
        }
    }

    /// Run the query through the session's invoker and map rows to records.
    pub fn execute(self) -> Result<Vec<Record<'t>>> {
        let fields = self.selection.resolve(self.table);
        if let Some(unknown) = fields.iter().find(|f| !self.table.has_column(f)) {
            return Err(Error::unknown_column(self.table.name(), unknown.as_str()));
        }

        let payload = CommandPayload::new(self.table.name())
            .fields(fields.iter().cloned())
            .condition(self.condition());
        let conn = self.session.connection();
        let rows = self
            .session
            .execute(ReadCommand::new(conn, payload))?
            .into_rows()
            .unwrap_or_default();

        tracing::debug!(table = self.table.name(), rows = rows.len(), "query executed");
        rows.into_iter()
            .map(|row| Record::from_pairs(self.table, fields.iter().zip(row)))
            .collect()
    }
}
