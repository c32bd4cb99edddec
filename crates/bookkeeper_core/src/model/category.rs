//! Expense category model.
//!
//! # Invariants
//! - `parent`, when set, refers to another persisted category.

use super::{FieldDescriptor, FieldKind, Model, Pk, RowCursor, UNASSIGNED_PK};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// Named expense category, optionally nested under a parent category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub pk: Pk,
    pub name: String,
    pub parent: Option<Pk>,
}

impl Category {
    /// Creates a transient top-level category.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            pk: UNASSIGNED_PK,
            name: name.into(),
            parent: None,
        }
    }

    /// Creates a transient category nested under `parent`.
    pub fn with_parent(name: impl Into<String>, parent: Pk) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new(name)
        }
    }
}

impl Model for Category {
    const TYPE_NAME: &'static str = "Category";
    const DESCRIPTOR: &'static [FieldDescriptor] = &[
        FieldDescriptor::new("pk", FieldKind::Integer),
        FieldDescriptor::new("name", FieldKind::Text),
        FieldDescriptor::new("parent", FieldKind::Integer),
    ];

    fn pk(&self) -> Pk {
        self.pk
    }

    fn set_pk(&mut self, pk: Pk) {
        self.pk = pk;
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::from(self.name.clone()), Value::from(self.parent)]
    }

    fn from_row(pk: Pk, cursor: &mut RowCursor<'_, '_>) -> rusqlite::Result<Self> {
        Ok(Self {
            pk,
            name: cursor.field()?,
            parent: cursor.field()?,
        })
    }
}
