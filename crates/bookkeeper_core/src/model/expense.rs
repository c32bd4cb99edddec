//! Expense record model.
//!
//! # Invariants
//! - `category` always refers to a persisted category.
//! - Dates are Unix epoch milliseconds.

use super::{FieldDescriptor, FieldKind, Model, Pk, RowCursor, UNASSIGNED_PK};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// One spending record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub pk: Pk,
    pub amount: f64,
    pub category: Pk,
    /// When the money was spent.
    pub expense_date: i64,
    /// When the record was entered.
    pub added_date: i64,
    pub comment: String,
}

impl Expense {
    /// Creates a transient expense spent and recorded at `date`.
    pub fn new(amount: f64, category: Pk, date: i64) -> Self {
        Self {
            pk: UNASSIGNED_PK,
            amount,
            category,
            expense_date: date,
            added_date: date,
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

impl Model for Expense {
    const TYPE_NAME: &'static str = "Expense";
    const DESCRIPTOR: &'static [FieldDescriptor] = &[
        FieldDescriptor::new("pk", FieldKind::Integer),
        FieldDescriptor::new("amount", FieldKind::Real),
        FieldDescriptor::new("category", FieldKind::Integer),
        FieldDescriptor::new("expense_date", FieldKind::Timestamp),
        FieldDescriptor::new("added_date", FieldKind::Timestamp),
        FieldDescriptor::new("comment", FieldKind::Text),
    ];

    fn pk(&self) -> Pk {
        self.pk
    }

    fn set_pk(&mut self, pk: Pk) {
        self.pk = pk;
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::from(self.amount),
            Value::from(self.category),
            Value::from(self.expense_date),
            Value::from(self.added_date),
            Value::from(self.comment.clone()),
        ]
    }

    fn from_row(pk: Pk, cursor: &mut RowCursor<'_, '_>) -> rusqlite::Result<Self> {
        Ok(Self {
            pk,
            amount: cursor.field()?,
            category: cursor.field()?,
            expense_date: cursor.field()?,
            added_date: cursor.field()?,
            comment: cursor.field()?,
        })
    }
}
