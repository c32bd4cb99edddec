//! In-process repository keeping objects in a map.
//!
//! # Responsibility
//! - Offer the `AbstractRepository` contract without a database, for
//!   callers that want throwaway storage.
//!
//! # Invariants
//! - Keys are assigned from 1 upwards and never reused.
//! - Preconditions and filter validation match `SqliteRepository`.

use super::{AbstractRepository, BoundModel, Filter, FilterColumn, RepoError, RepoResult};
use crate::model::{Model, Pk, UNASSIGNED_PK};
use rusqlite::types::Value;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// Repository storing clones of `T` keyed by primary key.
pub struct MemoryRepository<T> {
    bound: BoundModel,
    objects: RefCell<BTreeMap<Pk, T>>,
    last_pk: Cell<Pk>,
}

impl<T: Model + Clone> MemoryRepository<T> {
    pub fn new() -> RepoResult<Self> {
        Ok(Self {
            bound: BoundModel::of::<T>()?,
            objects: RefCell::new(BTreeMap::new()),
            last_pk: Cell::new(UNASSIGNED_PK),
        })
    }

    pub fn len(&self) -> usize {
        self.objects.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.borrow().is_empty()
    }
}

impl<T: Model + Clone> AbstractRepository<T> for MemoryRepository<T> {
    fn add(&self, obj: &mut T) -> RepoResult<Pk> {
        if obj.pk() != UNASSIGNED_PK {
            return Err(RepoError::InvalidArgument(format!(
                "attempt to add object with existing primary key {}",
                obj.pk()
            )));
        }
        self.bound.checked_values(obj)?;

        let pk = self.last_pk.get() + 1;
        self.last_pk.set(pk);
        obj.set_pk(pk);
        self.objects.borrow_mut().insert(pk, obj.clone());
        Ok(pk)
    }

    fn get(&self, pk: Pk) -> RepoResult<Option<T>> {
        Ok(self.objects.borrow().get(&pk).cloned())
    }

    fn get_all(&self, filter: Option<&Filter>) -> RepoResult<Vec<T>> {
        let predicates = match filter {
            Some(filter) => self.bound.resolve_filter(filter)?,
            None => Vec::new(),
        };

        let objects = self.objects.borrow();
        Ok(objects
            .values()
            .filter(|obj| {
                let values = obj.values();
                predicates.iter().all(|(column, expected)| match column {
                    FilterColumn::Pk => values_equal(&Value::Integer(obj.pk()), expected),
                    FilterColumn::Field(index) => values
                        .get(*index)
                        .is_some_and(|actual| values_equal(actual, expected)),
                })
            })
            .cloned()
            .collect())
    }

    fn update(&self, obj: &T) -> RepoResult<()> {
        if obj.pk() == UNASSIGNED_PK {
            return Err(RepoError::InvalidArgument(
                "attempt to update object with unknown primary key".to_string(),
            ));
        }
        self.bound.checked_values(obj)?;

        if let Some(stored) = self.objects.borrow_mut().get_mut(&obj.pk()) {
            *stored = obj.clone();
        }
        Ok(())
    }

    fn delete(&self, pk: Pk) -> RepoResult<()> {
        self.objects.borrow_mut().remove(&pk);
        Ok(())
    }
}

/// Equality as SQLite's `=`/`IS` would decide it for stored values.
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Integer(left), Value::Real(right)) | (Value::Real(right), Value::Integer(left)) => {
            (*left as f64) == *right
        }
        _ => actual == expected,
    }
}
