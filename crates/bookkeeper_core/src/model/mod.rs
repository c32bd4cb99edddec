//! Persisted domain models and their static field descriptors.
//!
//! # Responsibility
//! - Declare, per domain type, the ordered list of persisted fields.
//! - Project objects to positional SQL values and rebuild them from rows.
//!
//! # Invariants
//! - `DESCRIPTOR` contains `pk` exactly once plus every persisted field, in
//!   table column order.
//! - `values()` yields exactly one value per non-key descriptor entry, in
//!   descriptor order.
//! - `from_row` reads non-key columns through `RowCursor` in the same order.

pub mod budget;
pub mod category;
pub mod expense;

use rusqlite::types::{FromSql, Value};
use rusqlite::Row;

/// Storage-assigned row identifier.
pub type Pk = i64;

/// Primary key value carried by objects that were never persisted.
pub const UNASSIGNED_PK: Pk = 0;

/// Name of the primary-key column shared by every model table.
pub const PK_FIELD: &str = "pk";

/// Semantic type of one persisted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Real,
    /// Unix epoch milliseconds, stored as INTEGER.
    Timestamp,
}

impl FieldKind {
    /// Returns whether `value` is storable in a field of this kind.
    ///
    /// `NULL` is always accepted here; nullability is enforced by the table.
    /// Reals must be finite: SQLite stores NaN as `NULL`.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Text, Value::Text(_)) => true,
            (Self::Integer | Self::Timestamp, Value::Integer(_)) => true,
            (Self::Real, Value::Real(real)) => real.is_finite(),
            (Self::Real, Value::Integer(_)) => true,
            _ => false,
        }
    }
}

/// One `(name, kind)` entry of a model's field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// A domain type persisted into one table.
pub trait Model: Sized {
    /// Type name; the table name is its ASCII-lowercased form.
    const TYPE_NAME: &'static str;
    /// Ordered field table, including `pk`.
    const DESCRIPTOR: &'static [FieldDescriptor];

    fn pk(&self) -> Pk;
    fn set_pk(&mut self, pk: Pk);

    /// Non-key field values in descriptor order.
    fn values(&self) -> Vec<Value>;

    /// Rebuilds an object from a row whose key column is `pk`.
    fn from_row(pk: Pk, cursor: &mut RowCursor<'_, '_>) -> rusqlite::Result<Self>;
}

/// Positional reader over the non-key columns of a result row.
pub struct RowCursor<'a, 'stmt> {
    row: &'a Row<'stmt>,
    next: usize,
}

impl<'a, 'stmt> RowCursor<'a, 'stmt> {
    /// Starts reading right after the key column at index 0.
    pub(crate) fn new(row: &'a Row<'stmt>) -> Self {
        Self { row, next: 1 }
    }

    /// Reads the next column and advances.
    pub fn field<V: FromSql>(&mut self) -> rusqlite::Result<V> {
        let value = self.row.get(self.next)?;
        self.next += 1;
        Ok(value)
    }

    /// Number of non-key columns read so far.
    pub(crate) fn consumed(&self) -> usize {
        self.next - 1
    }
}
