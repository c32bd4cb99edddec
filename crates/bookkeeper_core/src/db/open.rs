//! Connection provider for SQLite file databases.
//!
//! # Responsibility
//! - Turn a storage location string into an open SQLite connection.
//! - Log connection failures with timing metadata.
//!
//! # Invariants
//! - Each call opens a new physical connection; nothing is cached.
//! - No busy timeout is configured, so a locked database surfaces
//!   immediately as a storage error.

use super::{DbError, DbResult};
use log::{debug, error};
use rusqlite::Connection;
use std::time::Instant;

/// Supplies database connections for a storage location.
///
/// Repositories call `connect` once per operation and drop the returned
/// connection before the operation returns.
pub trait ConnectionProvider {
    fn connect(&self, location: &str) -> DbResult<Connection>;
}

/// Opens plain SQLite file connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnectionProvider;

impl ConnectionProvider for SqliteConnectionProvider {
    fn connect(&self, location: &str) -> DbResult<Connection> {
        let started_at = Instant::now();

        if location.trim().is_empty() {
            error!(
                "event=db_open module=db status=error error_code=invalid_location duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return Err(DbError::InvalidLocation(location.to_string()));
        }

        match Connection::open(location) {
            Ok(conn) => {
                debug!(
                    "event=db_open module=db status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(conn)
            }
            Err(err) => {
                error!(
                    "event=db_open module=db status=error error_code=db_open_failed duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for &P {
    fn connect(&self, location: &str) -> DbResult<Connection> {
        (**self).connect(location)
    }
}
