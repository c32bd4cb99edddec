//! Generic repositories mapping `Model` types onto tables.
//!
//! # Responsibility
//! - Define the storage-agnostic repository contract shared by all models.
//! - Bind a model's static descriptor into a table name and ordered fields.
//! - Keep caller input out of SQL text: only descriptor names become
//!   identifiers, every value is bound through a placeholder.
//!
//! # Invariants
//! - A bound field list never changes after construction.
//! - Preconditions (`pk` state, value kinds, filter keys) are checked before
//!   any storage access.

pub mod filter;
pub mod memory_repo;
pub mod sqlite_repo;

use crate::db::DbError;
use crate::model::{FieldDescriptor, FieldKind, Model, Pk, PK_FIELD};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::ErrorCode;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use filter::Filter;

static IDENTIFIER_RE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$"));

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for model persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Storage rejected a write (uniqueness, foreign key, check, not-null).
    ConstraintViolation(rusqlite::Error),
    /// Caller broke a precondition; storage was not touched.
    InvalidArgument(String),
    /// A stored row could not be converted back into the model.
    InvalidData(String),
    MissingRequiredTable(String),
    SchemaMismatch {
        table: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
    Db(DbError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConstraintViolation(err) => write!(f, "constraint violation: {err}"),
            Self::InvalidArgument(message) => write!(f, "{message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::SchemaMismatch {
                table,
                expected,
                actual,
            } => write!(
                f,
                "table `{table}` has columns [{}], expected [{}]",
                actual.join(", "),
                expected.join(", ")
            ),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ConstraintViolation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidArgument(_)
            | Self::InvalidData(_)
            | Self::MissingRequiredTable(_)
            | Self::SchemaMismatch { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if value.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
            return Self::ConstraintViolation(value);
        }

        match value {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..) => Self::InvalidData(value.to_string()),
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}

/// Repository contract for one model type.
///
/// `NotFound` is never an error: `get` returns `None` and `get_all` returns
/// an empty vector.
pub trait AbstractRepository<T: Model> {
    /// Persists a transient object and assigns its storage identity.
    fn add(&self, obj: &mut T) -> RepoResult<Pk>;
    fn get(&self, pk: Pk) -> RepoResult<Option<T>>;
    /// Lists objects matching every predicate of `filter`, in storage order.
    fn get_all(&self, filter: Option<&Filter>) -> RepoResult<Vec<T>>;
    /// Overwrites every persisted field of an already stored object.
    fn update(&self, obj: &T) -> RepoResult<()>;
    /// Removes the object with `pk`; absent rows are not an error.
    fn delete(&self, pk: Pk) -> RepoResult<()>;
}

/// A model descriptor resolved into its table name and non-key fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BoundModel {
    pub(crate) table_name: String,
    pub(crate) fields: Vec<FieldDescriptor>,
}

impl BoundModel {
    /// Resolves `T::DESCRIPTOR`, stripping the key field.
    pub(crate) fn of<T: Model>() -> RepoResult<Self> {
        ensure_identifier(T::TYPE_NAME)?;

        let mut seen = HashSet::new();
        let mut pk_count = 0;
        let mut fields = Vec::with_capacity(T::DESCRIPTOR.len());
        for field in T::DESCRIPTOR {
            ensure_identifier(field.name)?;
            if !seen.insert(field.name) {
                return Err(RepoError::InvalidArgument(format!(
                    "descriptor of `{}` declares field `{}` twice",
                    T::TYPE_NAME,
                    field.name
                )));
            }
            if field.name == PK_FIELD {
                pk_count += 1;
            } else {
                fields.push(*field);
            }
        }

        if pk_count != 1 {
            return Err(RepoError::InvalidArgument(format!(
                "descriptor of `{}` must declare exactly one `{PK_FIELD}` field",
                T::TYPE_NAME
            )));
        }

        Ok(Self {
            table_name: T::TYPE_NAME.to_ascii_lowercase(),
            fields,
        })
    }

    /// Returns `obj`'s field values after checking count and kinds.
    pub(crate) fn checked_values<T: Model>(&self, obj: &T) -> RepoResult<Vec<Value>> {
        let values = obj.values();
        if values.len() != self.fields.len() {
            return Err(RepoError::InvalidArgument(format!(
                "`{}` yielded {} values for {} fields",
                self.table_name,
                values.len(),
                self.fields.len()
            )));
        }

        for (field, value) in self.fields.iter().zip(&values) {
            if !field.kind.accepts(value) {
                return Err(RepoError::InvalidArgument(format!(
                    "value for `{}.{}` does not match field kind {:?}",
                    self.table_name, field.name, field.kind
                )));
            }
        }

        Ok(values)
    }

    /// Maps every filter key to the column it constrains.
    ///
    /// `pk` is accepted alongside the non-key fields.
    pub(crate) fn resolve_filter<'f>(
        &self,
        filter: &'f Filter,
    ) -> RepoResult<Vec<(FilterColumn, &'f Value)>> {
        filter
            .iter()
            .map(|(key, value)| {
                let (column, kind) = if key == PK_FIELD {
                    (FilterColumn::Pk, FieldKind::Integer)
                } else {
                    let index = self
                        .fields
                        .iter()
                        .position(|field| field.name == key)
                        .ok_or_else(|| {
                            RepoError::InvalidArgument(format!(
                                "unknown filter field `{key}` for table `{}`",
                                self.table_name
                            ))
                        })?;
                    (FilterColumn::Field(index), self.fields[index].kind)
                };
                if !kind.accepts(value) {
                    return Err(RepoError::InvalidArgument(format!(
                        "filter value for `{}.{}` does not match field kind {:?}",
                        self.table_name,
                        self.column_name(column),
                        kind
                    )));
                }
                Ok((column, value))
            })
            .collect()
    }

    pub(crate) fn column_name(&self, column: FilterColumn) -> &'static str {
        match column {
            FilterColumn::Pk => PK_FIELD,
            FilterColumn::Field(index) => self.fields[index].name,
        }
    }
}

/// Column targeted by one filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FilterColumn {
    Pk,
    /// Index into `BoundModel::fields`.
    Field(usize),
}

fn ensure_identifier(name: &str) -> RepoResult<()> {
    let re = IDENTIFIER_RE
        .as_ref()
        .map_err(|err| RepoError::InvalidArgument(format!("identifier pattern: {err}")))?;
    if re.is_match(name) {
        Ok(())
    } else {
        Err(RepoError::InvalidArgument(format!(
            "`{name}` is not a valid SQL identifier"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundModel, FilterColumn, RepoError};
    use crate::model::{FieldDescriptor, FieldKind, Model, Pk, RowCursor};
    use crate::{Category, Expense, Filter};
    use rusqlite::types::Value;

    struct Broken;

    impl Model for Broken {
        const TYPE_NAME: &'static str = "Broken; DROP TABLE category";
        const DESCRIPTOR: &'static [FieldDescriptor] =
            &[FieldDescriptor::new("pk", FieldKind::Integer)];

        fn pk(&self) -> Pk {
            0
        }

        fn set_pk(&mut self, _pk: Pk) {}

        fn values(&self) -> Vec<Value> {
            Vec::new()
        }

        fn from_row(_pk: Pk, _cursor: &mut RowCursor<'_, '_>) -> rusqlite::Result<Self> {
            Ok(Self)
        }
    }

    struct Keyless;

    impl Model for Keyless {
        const TYPE_NAME: &'static str = "Keyless";
        const DESCRIPTOR: &'static [FieldDescriptor] =
            &[FieldDescriptor::new("name", FieldKind::Text)];

        fn pk(&self) -> Pk {
            0
        }

        fn set_pk(&mut self, _pk: Pk) {}

        fn values(&self) -> Vec<Value> {
            vec![Value::Null]
        }

        fn from_row(_pk: Pk, _cursor: &mut RowCursor<'_, '_>) -> rusqlite::Result<Self> {
            Ok(Self)
        }
    }

    #[test]
    fn bound_model_lowercases_type_name_and_strips_pk() {
        let bound = BoundModel::of::<Expense>().unwrap();
        assert_eq!(bound.table_name, "expense");
        let names: Vec<_> = bound.fields.iter().map(|field| field.name).collect();
        assert_eq!(
            names,
            vec!["amount", "category", "expense_date", "added_date", "comment"]
        );
    }

    #[test]
    fn bound_model_rejects_non_identifier_names() {
        let err = BoundModel::of::<Broken>().unwrap_err();
        assert!(matches!(err, RepoError::InvalidArgument(_)));
    }

    #[test]
    fn bound_model_requires_a_key_field() {
        let err = BoundModel::of::<Keyless>().unwrap_err();
        assert!(err.to_string().contains("exactly one `pk`"));
    }

    #[test]
    fn checked_values_follow_descriptor_order() {
        let bound = BoundModel::of::<Category>().unwrap();
        let category = Category::with_parent("food", 3);

        assert_eq!(
            bound.checked_values(&category).unwrap(),
            vec![Value::Text("food".to_string()), Value::Integer(3)]
        );
    }

    #[test]
    fn checked_values_rejects_kind_mismatch() {
        let bound = BoundModel {
            table_name: "category".to_string(),
            fields: vec![
                FieldDescriptor::new("name", FieldKind::Integer),
                FieldDescriptor::new("parent", FieldKind::Integer),
            ],
        };
        let err = bound.checked_values(&Category::new("food")).unwrap_err();
        assert!(err.to_string().contains("category.name"));
    }

    #[test]
    fn resolve_filter_keeps_every_key_in_insertion_order() {
        let bound = BoundModel::of::<Expense>().unwrap();
        let filter = Filter::new()
            .eq("comment", "lunch".to_string())
            .eq("category", 2_i64)
            .eq("amount", 10.5);

        let resolved = bound.resolve_filter(&filter).unwrap();
        let columns: Vec<_> = resolved.iter().map(|(column, _)| *column).collect();
        assert_eq!(
            columns,
            vec![
                FilterColumn::Field(4),
                FilterColumn::Field(1),
                FilterColumn::Field(0)
            ]
        );
    }

    #[test]
    fn resolve_filter_accepts_the_key_column_as_integer() {
        let bound = BoundModel::of::<Category>().unwrap();

        let by_pk = Filter::new().eq("pk", 3_i64);
        let resolved = bound.resolve_filter(&by_pk).unwrap();
        assert_eq!(resolved[0].0, FilterColumn::Pk);
        assert_eq!(bound.column_name(resolved[0].0), "pk");

        let text_pk = Filter::new().eq("pk", "3".to_string());
        assert!(matches!(
            bound.resolve_filter(&text_pk),
            Err(RepoError::InvalidArgument(_))
        ));
    }

    #[test]
    fn resolve_filter_rejects_unknown_keys_and_wrong_kinds() {
        let bound = BoundModel::of::<Expense>().unwrap();

        let unknown = Filter::new().eq("amount; DROP TABLE expense", 1_i64);
        assert!(matches!(
            bound.resolve_filter(&unknown),
            Err(RepoError::InvalidArgument(_))
        ));

        let wrong_kind = Filter::new().eq("category", "two".to_string());
        assert!(matches!(
            bound.resolve_filter(&wrong_kind),
            Err(RepoError::InvalidArgument(_))
        ));
    }

    #[test]
    fn constraint_failures_map_to_constraint_violation() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (pk INTEGER PRIMARY KEY, name TEXT NOT NULL);")
            .unwrap();
        let err = conn
            .execute("INSERT INTO t (name) VALUES (NULL);", [])
            .unwrap_err();

        assert!(matches!(
            RepoError::from(err),
            RepoError::ConstraintViolation(_)
        ));
    }
}
