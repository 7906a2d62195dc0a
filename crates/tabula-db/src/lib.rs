//! tabula-db: pooled SQLite access with undoable CRUD commands.
//!
//! # Modules
//!
//! - `pool` - Fixed-size, non-blocking connection pool
//! - `store` - Facade with scoped acquire/run/release
//! - `command` - Create/Read/Update/Delete commands and their undo records
//! - `invoker` - Command history with single-step undo
//! - `schema` - Table and column definitions
//! - `record` - Validated records, sessions and repositories
//! - `query` - Fluent read queries
//! - `migration` - Named, tracked migrations
//!
//! # Example
//!
//! ```
//! use rusqlite::types::Value;
//! use tabula_db::command::{CommandPayload, CreateCommand};
//! use tabula_db::invoker::CommandInvoker;
//! use tabula_db::store::Store;
//!
//! let store = Store::in_memory(2).unwrap();
//! store
//!     .execute_query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", &[])
//!     .unwrap();
//!
//! let conn = store.connect().unwrap();
//! let mut invoker = CommandInvoker::new();
//! let payload = CommandPayload::new("users")
//!     .fields(["name"])
//!     .values([Value::Text("John".into())]);
//! let outcome = invoker
//!     .execute_command(CreateCommand::new(&conn, payload))
//!     .unwrap();
//! assert_eq!(outcome.created_id(), Some(1));
//!
//! invoker.undo_last().unwrap();
//! ```

pub mod command;
pub mod invoker;
pub mod migration;
pub mod pool;
pub mod query;
pub mod record;
pub mod rows;
pub mod schema;
pub mod store;

pub use command::{Command, CommandKind, CommandPayload, Executed, Outcome};
pub use invoker::CommandInvoker;
pub use pool::{ConnectionHandle, ConnectionPool, PoolStatus};
pub use record::{Record, Repository, Session};
pub use rows::{Row, RowSet};
pub use schema::{Column, ColumnType, TableDef};
pub use store::Store;
