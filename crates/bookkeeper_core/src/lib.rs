//! Generic SQLite persistence for bookkeeper domain models.
//! Models declare their persisted fields statically; repositories turn those
//! declarations into parameterized SQL.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use db::{ConnectionProvider, DbError, DbResult, SqliteConnectionProvider};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use model::budget::{Budget, BudgetPeriod};
pub use model::category::Category;
pub use model::expense::Expense;
pub use model::{FieldDescriptor, FieldKind, Model, Pk, RowCursor, PK_FIELD, UNASSIGNED_PK};
pub use repo::memory_repo::MemoryRepository;
pub use repo::sqlite_repo::SqliteRepository;
pub use repo::{AbstractRepository, Filter, RepoError, RepoResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
