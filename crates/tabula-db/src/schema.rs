//! Table definitions built from typed column constructors.
//!
//! ```
//! use tabula_db::schema::{Column, TableDef};
//!
//! let users = TableDef::new("users")
//!     .column(Column::integer("id").primary_key())
//!     .column(Column::string("name", 50).not_null())
//!     .column(Column::string("email", 100).not_null());
//!
//! assert_eq!(
//!     users.create_sql(),
//!     "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, \
//!      name VARCHAR(50) NOT NULL, email VARCHAR(100) NOT NULL);"
//! );
//! ```

use std::fmt;

use tabula_core::Result;

use crate::store::Store;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Varchar(u32),
    Text,
    Real,
    Blob,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => f.write_str("INTEGER"),
            ColumnType::Varchar(len) => write!(f, "VARCHAR({len})"),
            ColumnType::Text => f.write_str("TEXT"),
            ColumnType::Real => f.write_str("REAL"),
            ColumnType::Blob => f.write_str("BLOB"),
        }
    }
}

/// One column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub not_null: bool,
    /// SQL literal rendered verbatim after `DEFAULT`.
    pub default: Option<String>,
}

impl Column {
    fn with_type(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            not_null: false,
            default: None,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::with_type(name, ColumnType::Integer)
    }

    pub fn string(name: impl Into<String>, length: u32) -> Self {
        Self::with_type(name, ColumnType::Varchar(length))
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::with_type(name, ColumnType::Text)
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self::with_type(name, ColumnType::Real)
    }

    pub fn blob(name: impl Into<String>) -> Self {
        Self::with_type(name, ColumnType::Blob)
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default_value(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.column_type)?;
        if self.primary_key {
            f.write_str(" PRIMARY KEY")?;
        }
        if self.not_null {
            f.write_str(" NOT NULL")?;
        }
        if let Some(default) = &self.default {
            write!(f, " DEFAULT {default}")?;
        }
        Ok(())
    }
}

/// A table name and its ordered columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    name: String,
    columns: Vec<Column>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Append a column.
    pub fn column(mut self, column: Column) -> Self {
        self.add_column(column);
        self
    }

    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Name of the primary-key column, falling back to `id`.
    pub fn primary_key(&self) -> &str {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .unwrap_or("id")
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this definition.
    pub fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE IF NOT EXISTS {} ({columns});", self.name)
    }

    /// Create the table through the store facade.
    pub fn create_in(&self, store: &Store) -> Result<()> {
        tracing::info!("Creating table {}", self.name);
        store.execute_query(&self.create_sql(), &[])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableDef {
        TableDef::new("users")
            .column(Column::integer("id").primary_key())
            .column(Column::string("name", 50).not_null())
            .column(Column::string("email", 100))
    }

    #[test]
    fn renders_column_attributes() {
        let col = Column::integer("score").not_null().default_value("0");
        assert_eq!(col.to_string(), "score INTEGER NOT NULL DEFAULT 0");
        assert_eq!(Column::real("ratio").to_string(), "ratio REAL");
        assert_eq!(Column::blob("data").to_string(), "data BLOB");
        assert_eq!(
            Column::text("bio").default_value("'none'").to_string(),
            "bio TEXT DEFAULT 'none'"
        );
    }

    #[test]
    fn renders_create_table() {
        assert_eq!(
            users().create_sql(),
            "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name VARCHAR(50) NOT NULL, email VARCHAR(100));"
        );
    }

    #[test]
    fn column_lookup() {
        let table = users();
        assert_eq!(table.column_names(), ["id", "name", "email"]);
        assert!(table.has_column("email"));
        assert!(!table.has_column("age"));
        assert_eq!(table.primary_key(), "id");
        assert_eq!(TableDef::new("bare").primary_key(), "id");
    }

    #[test]
    fn add_column_extends_in_order() {
        let mut table = users();
        table.add_column(Column::integer("age"));
        assert_eq!(table.columns().last().unwrap().name, "age");
        assert_eq!(table.columns().len(), 4);
    }

    #[test]
    fn create_in_is_rerunnable() {
        let store = Store::in_memory(1).unwrap();
        let table = users();
        table.create_in(&store).unwrap();
        table.create_in(&store).unwrap();

        let rows = store
            .execute_query(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'",
                &[],
            )
            .unwrap();
        assert_eq!(rows, vec![vec![rusqlite::types::Value::Integer(1)]]);
    }
}
