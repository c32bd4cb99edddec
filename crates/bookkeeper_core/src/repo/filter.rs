//! Equality filters for `get_all`.
//!
//! # Invariants
//! - Each key appears at most once; re-inserting a key replaces its value.
//! - Keys keep their first insertion order.

use rusqlite::types::Value;

/// Conjunction of `field = value` predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the predicate `field = value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        match self.predicates.iter_mut().find(|(key, _)| *key == field) {
            Some(existing) => existing.1 = value,
            None => self.predicates.push((field, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.predicates
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for Filter
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filter = Self::new();
        for (key, value) in iter {
            filter.insert(key, value);
        }
        filter
    }
}
