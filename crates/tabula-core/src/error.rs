//! Unified error type for tabula.
//!
//! Every crate in the workspace reports failures through [`Error`]. The
//! variants follow the failure taxonomy of the data-access layer: bad
//! configuration, pool exhaustion, statements rejected by the store, and
//! contract violations caught before the store is touched.

/// Error text SQLite uses when a table, index or trigger is created twice.
const ALREADY_EXISTS: &str = "already exists";

/// Unified error type covering all failure modes in tabula.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The store location or pool settings are unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Every pooled connection is currently checked out.
    #[error("Connection pool exhausted: all {max} connections are checked out")]
    PoolExhausted {
        /// Configured pool size.
        max: u32,
    },

    /// The pool could not open its store sessions.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The store rejected a statement.
    #[error("Statement failed [{sql}]: {source}")]
    Statement {
        /// SQL text that was being executed.
        sql: String,
        /// The underlying store error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A caller broke a precondition of a command or record operation.
    #[error("Contract violation: {0}")]
    Contract(String),

    /// A record was accessed with a key its table does not declare.
    #[error("Unknown column '{column}' for table '{table}'")]
    UnknownColumn {
        /// Table the record belongs to.
        table: String,
        /// The rejected key.
        column: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// Convenience constructor for [`Error::Configuration`].
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Convenience constructor for [`Error::Connection`].
    pub fn connection(msg: impl Into<String>) -> Self {
        Error::Connection(msg.into())
    }

    /// Convenience constructor for [`Error::Statement`].
    pub fn statement(
        sql: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Statement {
            sql: sql.into(),
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Contract`].
    pub fn contract(msg: impl Into<String>) -> Self {
        Error::Contract(msg.into())
    }

    /// Convenience constructor for [`Error::UnknownColumn`].
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// True when the store refused to create an object that is already there.
    pub fn is_already_exists(&self) -> bool {
        match self {
            Error::Statement { source, .. } => source.to_string().contains(ALREADY_EXISTS),
            _ => false,
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
