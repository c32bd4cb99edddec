//! Table layout for the bundled bookkeeper models.
//!
//! # Responsibility
//! - Create the `category`, `expense` and `budget` tables when missing.
//! - Inspect physical table layout for repository schema checks.
//!
//! # Invariants
//! - Column order in `schema.sql` mirrors each model's field descriptor.
//! - Table names passed to `table_columns` come from static descriptors only.

use super::DbResult;
use rusqlite::Connection;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Creates the bookkeeper tables if they do not exist yet.
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Returns whether a table with the given name exists.
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Wraps `name` in double quotes so keywords such as `order` stay valid
/// identifiers.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Returns the column names of `table` in physical order.
pub fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", quote_identifier(table)))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get(1)?);
    }
    Ok(columns)
}
