//! SQLite connection acquisition and schema helpers.
//!
//! # Responsibility
//! - Hand out one fresh SQLite connection per repository operation.
//! - Provide the bookkeeper table layout for callers that need to create it.
//!
//! # Invariants
//! - Connections are never pooled or shared across operations.
//! - Connection pragmas beyond SQLite defaults are set by the caller that
//!   needs them (the repository enables `foreign_keys` before inserts).

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{ConnectionProvider, SqliteConnectionProvider};
pub use schema::{init_schema, quote_identifier, table_columns, table_exists};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    InvalidLocation(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidLocation(location) => {
                write!(f, "invalid database location `{location}`")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidLocation(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
