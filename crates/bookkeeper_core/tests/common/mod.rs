#![allow(dead_code)]

use bookkeeper_core::db::init_schema;
use bookkeeper_core::{
    ConnectionProvider, DbResult, FieldDescriptor, FieldKind, Model, Pk, RowCursor,
    SqliteConnectionProvider, UNASSIGNED_PK,
};
use rusqlite::types::Value;
use rusqlite::Connection;
use std::cell::Cell;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub pk: Pk,
    pub name: String,
    pub price: f64,
}

impl Item {
    pub fn new(name: &str, price: f64) -> Self {
        Self {
            pk: UNASSIGNED_PK,
            name: name.to_string(),
            price,
        }
    }
}

impl Model for Item {
    const TYPE_NAME: &'static str = "Item";
    const DESCRIPTOR: &'static [FieldDescriptor] = &[
        FieldDescriptor::new("pk", FieldKind::Integer),
        FieldDescriptor::new("name", FieldKind::Text),
        FieldDescriptor::new("price", FieldKind::Real),
    ];

    fn pk(&self) -> Pk {
        self.pk
    }

    fn set_pk(&mut self, pk: Pk) {
        self.pk = pk;
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::from(self.name.clone()), Value::from(self.price)]
    }

    fn from_row(pk: Pk, cursor: &mut RowCursor<'_, '_>) -> rusqlite::Result<Self> {
        Ok(Self {
            pk,
            name: cursor.field()?,
            price: cursor.field()?,
        })
    }
}

/// Model whose table and field names are SQL keywords.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub pk: Pk,
    pub group: String,
}

impl Order {
    pub fn new(group: &str) -> Self {
        Self {
            pk: UNASSIGNED_PK,
            group: group.to_string(),
        }
    }
}

impl Model for Order {
    const TYPE_NAME: &'static str = "Order";
    const DESCRIPTOR: &'static [FieldDescriptor] = &[
        FieldDescriptor::new("pk", FieldKind::Integer),
        FieldDescriptor::new("group", FieldKind::Text),
    ];

    fn pk(&self) -> Pk {
        self.pk
    }

    fn set_pk(&mut self, pk: Pk) {
        self.pk = pk;
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::from(self.group.clone())]
    }

    fn from_row(pk: Pk, cursor: &mut RowCursor<'_, '_>) -> rusqlite::Result<Self> {
        Ok(Self {
            pk,
            group: cursor.field()?,
        })
    }
}

/// Temporary database file holding the bookkeeper tables plus `item` and `order`.
pub struct TestDb {
    _dir: TempDir,
    pub location: String,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let location = dir
            .path()
            .join("bookkeeper.db")
            .to_str()
            .unwrap()
            .to_string();

        let conn = Connection::open(&location).unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"CREATE TABLE item (pk INTEGER PRIMARY KEY, name TEXT, price REAL);
               CREATE TABLE "order" (pk INTEGER PRIMARY KEY, "group" TEXT);"#,
        )
        .unwrap();

        Self {
            _dir: dir,
            location,
        }
    }

    pub fn connect(&self) -> Connection {
        Connection::open(&self.location).unwrap()
    }

    pub fn row_count(&self, table: &str) -> i64 {
        self.connect()
            .query_row(&format!("SELECT COUNT(*) FROM \"{table}\";"), [], |row| {
                row.get(0)
            })
            .unwrap()
    }
}

/// Provider that counts how many connections were opened.
#[derive(Default)]
pub struct CountingProvider {
    pub opened: Cell<usize>,
}

impl ConnectionProvider for CountingProvider {
    fn connect(&self, location: &str) -> DbResult<Connection> {
        self.opened.set(self.opened.get() + 1);
        SqliteConnectionProvider.connect(location)
    }
}
