//! SQLite implementation of the generic repository.
//!
//! # Responsibility
//! - Generate INSERT/SELECT/UPDATE/DELETE statements from a bound model.
//! - Open one connection per operation and release it before returning.
//!
//! # Invariants
//! - Identifiers in SQL text come from the model descriptor only and are
//!   always double-quoted.
//! - Inserts run with `PRAGMA foreign_keys = ON`.
//! - Rows are rebuilt positionally: `pk` first, then fields in descriptor
//!   order.

use super::{AbstractRepository, BoundModel, Filter, RepoError, RepoResult};
use crate::db::{
    quote_identifier, table_columns, table_exists, ConnectionProvider, SqliteConnectionProvider,
};
use crate::model::{Model, Pk, RowCursor, PK_FIELD, UNASSIGNED_PK};
use log::{debug, error};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::marker::PhantomData;
use std::time::Instant;

/// SQL text generated once per repository.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Statements {
    insert: String,
    select: String,
    select_by_pk: String,
    update: Option<String>,
    delete: String,
}

impl Statements {
    fn build(bound: &BoundModel) -> Self {
        let table = quote_identifier(&bound.table_name);
        let pk = quote_identifier(PK_FIELD);
        let names: Vec<String> = bound
            .fields
            .iter()
            .map(|field| quote_identifier(field.name))
            .collect();

        let insert = if names.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES;")
        } else {
            let placeholders: Vec<String> =
                (1..=names.len()).map(|index| format!("?{index}")).collect();
            format!(
                "INSERT INTO {table} ({}) VALUES ({});",
                names.join(", "),
                placeholders.join(", ")
            )
        };

        let columns = std::iter::once(pk.as_str())
            .chain(names.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(", ");
        let select = format!("SELECT {columns} FROM {table}");
        let select_by_pk = format!("{select} WHERE {pk} = ?1;");

        let update = if names.is_empty() {
            None
        } else {
            let assignments: Vec<String> = names
                .iter()
                .enumerate()
                .map(|(index, name)| format!("{name} = ?{}", index + 1))
                .collect();
            Some(format!(
                "UPDATE {table} SET {} WHERE {pk} = ?{};",
                assignments.join(", "),
                names.len() + 1
            ))
        };

        let delete = format!("DELETE FROM {table} WHERE {pk} = ?1;");

        Self {
            insert,
            select,
            select_by_pk,
            update,
            delete,
        }
    }
}

/// Repository persisting `T` into the table named after `T::TYPE_NAME`.
///
/// Holds no connection between calls; every operation acquires one from
/// the provider and drops it on all exit paths.
pub struct SqliteRepository<T, P = SqliteConnectionProvider> {
    location: String,
    provider: P,
    bound: BoundModel,
    statements: Statements,
    _model: PhantomData<fn() -> T>,
}

impl<T: Model> SqliteRepository<T> {
    /// Binds `T` to the SQLite file at `location`.
    ///
    /// No storage access happens here; see `verify_schema`.
    pub fn new(location: impl Into<String>) -> RepoResult<Self> {
        Self::with_provider(location, SqliteConnectionProvider)
    }
}

impl<T: Model, P: ConnectionProvider> SqliteRepository<T, P> {
    pub fn with_provider(location: impl Into<String>, provider: P) -> RepoResult<Self> {
        let bound = BoundModel::of::<T>()?;
        let statements = Statements::build(&bound);
        Ok(Self {
            location: location.into(),
            provider,
            bound,
            statements,
            _model: PhantomData,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn table_name(&self) -> &str {
        &self.bound.table_name
    }

    /// Non-key field names in column order.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.bound.fields.iter().map(|field| field.name).collect()
    }

    /// Checks that the bound table exists with columns `pk, fields...`.
    pub fn verify_schema(&self) -> RepoResult<()> {
        let conn = self.connect()?;
        let table = self.table_name();

        if !table_exists(&conn, table)? {
            return Err(RepoError::MissingRequiredTable(table.to_string()));
        }

        let actual = table_columns(&conn, table)?;
        let expected: Vec<String> = std::iter::once(PK_FIELD)
            .chain(self.bound.fields.iter().map(|field| field.name))
            .map(str::to_string)
            .collect();
        if actual != expected {
            return Err(RepoError::SchemaMismatch {
                table: table.to_string(),
                expected,
                actual,
            });
        }

        Ok(())
    }

    fn connect(&self) -> RepoResult<Connection> {
        self.provider
            .connect(&self.location)
            .map_err(RepoError::from)
    }

    fn parse_row(&self, row: &Row<'_>) -> RepoResult<T> {
        let pk: Pk = row.get(0)?;
        let mut cursor = RowCursor::new(row);
        let obj = T::from_row(pk, &mut cursor)?;
        if cursor.consumed() != self.bound.fields.len() {
            return Err(RepoError::InvalidData(format!(
                "row reader for `{}` consumed {} columns, expected {}",
                self.bound.table_name,
                cursor.consumed(),
                self.bound.fields.len()
            )));
        }
        Ok(obj)
    }

    fn filtered_select(&self, filter: Option<&Filter>) -> RepoResult<(String, Vec<Value>)> {
        let Some(filter) = filter.filter(|candidate| !candidate.is_empty()) else {
            return Ok((format!("{};", self.statements.select), Vec::new()));
        };

        let resolved = self.bound.resolve_filter(filter)?;
        let mut predicates = Vec::with_capacity(resolved.len());
        let mut bind_values = Vec::with_capacity(resolved.len());
        for (position, (column, value)) in resolved.into_iter().enumerate() {
            let name = quote_identifier(self.bound.column_name(column));
            let operator = if matches!(value, Value::Null) {
                "IS"
            } else {
                "="
            };
            predicates.push(format!("{name} {operator} ?{}", position + 1));
            bind_values.push(value.clone());
        }

        Ok((
            format!(
                "{} WHERE {};",
                self.statements.select,
                predicates.join(" AND ")
            ),
            bind_values,
        ))
    }

    fn log_outcome<R>(&self, event: &str, started_at: Instant, result: &RepoResult<R>) {
        match result {
            Ok(_) => debug!(
                "event={event} module=repo status=ok table={} duration_ms={}",
                self.bound.table_name,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event={event} module=repo status=error table={} duration_ms={} error={}",
                self.bound.table_name,
                started_at.elapsed().as_millis(),
                err
            ),
        }
    }
}

impl<T: Model, P: ConnectionProvider> AbstractRepository<T> for SqliteRepository<T, P> {
    fn add(&self, obj: &mut T) -> RepoResult<Pk> {
        let started_at = Instant::now();
        if obj.pk() != UNASSIGNED_PK {
            return Err(RepoError::InvalidArgument(format!(
                "attempt to add object with existing primary key {}",
                obj.pk()
            )));
        }
        let values = self.bound.checked_values(obj)?;

        let result = self.connect().and_then(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.execute(&self.statements.insert, params_from_iter(values))?;
            Ok(conn.last_insert_rowid())
        });
        self.log_outcome("repo_add", started_at, &result);

        let pk = result?;
        obj.set_pk(pk);
        Ok(pk)
    }

    fn get(&self, pk: Pk) -> RepoResult<Option<T>> {
        let started_at = Instant::now();
        let result = self.connect().and_then(|conn| {
            let mut stmt = conn.prepare(&self.statements.select_by_pk)?;
            let mut rows = stmt.query([pk])?;
            if let Some(row) = rows.next()? {
                return Ok(Some(self.parse_row(row)?));
            }
            Ok(None)
        });
        self.log_outcome("repo_get", started_at, &result);
        result
    }

    fn get_all(&self, filter: Option<&Filter>) -> RepoResult<Vec<T>> {
        let started_at = Instant::now();
        let (sql, bind_values) = self.filtered_select(filter)?;

        let result = self.connect().and_then(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            let mut objects = Vec::new();
            while let Some(row) = rows.next()? {
                objects.push(self.parse_row(row)?);
            }
            Ok(objects)
        });
        self.log_outcome("repo_get_all", started_at, &result);
        result
    }

    fn update(&self, obj: &T) -> RepoResult<()> {
        let started_at = Instant::now();
        if obj.pk() == UNASSIGNED_PK {
            return Err(RepoError::InvalidArgument(
                "attempt to update object with unknown primary key".to_string(),
            ));
        }
        let mut bind_values = self.bound.checked_values(obj)?;
        let Some(sql) = self.statements.update.as_deref() else {
            return Ok(());
        };
        bind_values.push(Value::Integer(obj.pk()));

        let result = self.connect().and_then(|conn| {
            conn.execute(sql, params_from_iter(bind_values))
                .map_err(RepoError::from)
        });
        self.log_outcome("repo_update", started_at, &result);

        if result? == 0 {
            debug!(
                "event=repo_update module=repo status=noop table={} pk={}",
                self.bound.table_name,
                obj.pk()
            );
        }
        Ok(())
    }

    fn delete(&self, pk: Pk) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.connect().and_then(|conn| {
            conn.execute(&self.statements.delete, [pk])
                .map_err(RepoError::from)
        });
        self.log_outcome("repo_delete", started_at, &result);
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::{SqliteRepository, Statements};
    use crate::model::budget::Budget;
    use crate::repo::BoundModel;
    use crate::{Category, Expense, Filter};

    #[test]
    fn statements_name_columns_in_descriptor_order() {
        let statements = Statements::build(&BoundModel::of::<Category>().unwrap());

        assert_eq!(
            statements.insert,
            r#"INSERT INTO "category" ("name", "parent") VALUES (?1, ?2);"#
        );
        assert_eq!(
            statements.select,
            r#"SELECT "pk", "name", "parent" FROM "category""#
        );
        assert_eq!(
            statements.select_by_pk,
            r#"SELECT "pk", "name", "parent" FROM "category" WHERE "pk" = ?1;"#
        );
        assert_eq!(
            statements.update.as_deref(),
            Some(r#"UPDATE "category" SET "name" = ?1, "parent" = ?2 WHERE "pk" = ?3;"#)
        );
        assert_eq!(
            statements.delete,
            r#"DELETE FROM "category" WHERE "pk" = ?1;"#
        );
    }

    #[test]
    fn filtered_select_binds_every_key_through_placeholders() {
        let repo = SqliteRepository::<Expense>::new("unused.db").unwrap();
        let filter = Filter::new()
            .eq("comment", "x' OR '1'='1".to_string())
            .eq("category", 7_i64);

        let (sql, values) = repo.filtered_select(Some(&filter)).unwrap();
        assert_eq!(
            sql,
            concat!(
                r#"SELECT "pk", "amount", "category", "expense_date", "added_date", "comment" "#,
                r#"FROM "expense" WHERE "comment" = ?1 AND "category" = ?2;"#
            )
        );
        assert_eq!(values.len(), 2);
        assert!(!sql.contains("OR"));
    }

    #[test]
    fn filtered_select_uses_is_for_null_values() {
        let repo = SqliteRepository::<Budget>::new("unused.db").unwrap();
        let filter = Filter::new().eq("category", rusqlite::types::Value::Null);

        let (sql, values) = repo.filtered_select(Some(&filter)).unwrap();
        assert!(sql.ends_with(r#"WHERE "category" IS ?1;"#));
        assert_eq!(values, vec![rusqlite::types::Value::Null]);
    }

    #[test]
    fn empty_filter_selects_the_whole_bound_table() {
        let repo = SqliteRepository::<Category>::new("unused.db").unwrap();

        let (sql, values) = repo.filtered_select(Some(&Filter::new())).unwrap();
        assert_eq!(sql, r#"SELECT "pk", "name", "parent" FROM "category";"#);
        assert!(values.is_empty());
        assert_eq!(repo.table_name(), "category");
        assert_eq!(repo.field_names(), vec!["name", "parent"]);
    }

    #[test]
    fn filtered_select_accepts_the_key_column() {
        let repo = SqliteRepository::<Category>::new("unused.db").unwrap();
        let filter = Filter::new().eq("pk", 4_i64).eq("name", "food".to_string());

        let (sql, values) = repo.filtered_select(Some(&filter)).unwrap();
        assert!(sql.ends_with(r#"WHERE "pk" = ?1 AND "name" = ?2;"#));
        assert_eq!(values.len(), 2);
    }
}
