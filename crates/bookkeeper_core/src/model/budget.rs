//! Spending budget model.

use super::{FieldDescriptor, FieldKind, Model, Pk, RowCursor, UNASSIGNED_PK};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, Value, ValueRef};
use serde::{Deserialize, Serialize};

/// Length of the window a budget limits spending over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Day,
    Week,
    Month,
}

impl BudgetPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }
}

impl FromSql for BudgetPeriod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Self::parse(text)
            .ok_or_else(|| FromSqlError::Other(format!("invalid budget period `{text}`").into()))
    }
}

impl From<BudgetPeriod> for Value {
    fn from(value: BudgetPeriod) -> Self {
        Value::Text(value.as_str().to_string())
    }
}

/// Spending limit for one period, either global or scoped to a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub pk: Pk,
    pub period: BudgetPeriod,
    pub amount: f64,
    /// `None` limits spending across all categories.
    pub category: Option<Pk>,
}

impl Budget {
    pub fn new(period: BudgetPeriod, amount: f64) -> Self {
        Self {
            pk: UNASSIGNED_PK,
            period,
            amount,
            category: None,
        }
    }
}

impl Model for Budget {
    const TYPE_NAME: &'static str = "Budget";
    const DESCRIPTOR: &'static [FieldDescriptor] = &[
        FieldDescriptor::new("pk", FieldKind::Integer),
        FieldDescriptor::new("period", FieldKind::Text),
        FieldDescriptor::new("amount", FieldKind::Real),
        FieldDescriptor::new("category", FieldKind::Integer),
    ];

    fn pk(&self) -> Pk {
        self.pk
    }

    fn set_pk(&mut self, pk: Pk) {
        self.pk = pk;
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::from(self.period),
            Value::from(self.amount),
            Value::from(self.category),
        ]
    }

    fn from_row(pk: Pk, cursor: &mut RowCursor<'_, '_>) -> rusqlite::Result<Self> {
        Ok(Self {
            pk,
            period: cursor.field()?,
            amount: cursor.field()?,
            category: cursor.field()?,
        })
    }
}
