//! Task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the transactional store API the screen controller depends on.
//! - Isolate SQL details from screen/host orchestration.
//!
//! # Invariants
//! - Every mutation runs inside one atomic write transaction.
//! - Mutations on stale references fail with `StoreError::Invalidated`.
//! - Live queries observe every committed write.

use crate::db::DbError;
use crate::model::task::{NewTask, Task, TaskId, TaskValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod live;
mod sqlite;

pub use live::{LiveTasks, SortDirection, SortField, TaskQuery, TaskSnapshot, TaskSort};
pub use sqlite::SqliteTaskStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from task store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Field-level validation failed before persistence.
    Validation(TaskValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// A task with the same identifier already exists.
    DuplicateId(TaskId),
    /// Referenced task was deleted after the reference was obtained.
    Invalidated(TaskId),
    /// An update mutator tried to change a field fixed at creation.
    ImmutableField(&'static str),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted row cannot be converted into a valid task.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "task already exists: {id}"),
            Self::Invalidated(id) => write!(f, "task no longer exists: {id}"),
            Self::ImmutableField(field) => write!(f, "task field `{field}` cannot be changed"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "task store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "task store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "task store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Embedded task store consumed by the screen controller.
pub trait TaskStore {
    /// Inserts one task inside a write transaction.
    fn create(&self, fields: NewTask) -> StoreResult<Task>;
    /// Reloads `task`, applies `mutator` in place and persists the result.
    fn update<F>(&self, task: &Task, mutator: F) -> StoreResult<Task>
    where
        F: FnOnce(&mut Task);
    /// Removes `task`; fails for references that are already gone.
    fn delete(&self, task: &Task) -> StoreResult<()>;
    /// Opens a live query that follows every later committed write.
    fn query(&self, query: TaskQuery) -> StoreResult<LiveTasks>;
    /// Returns a one-shot sorted snapshot.
    fn fetch(&self, query: &TaskQuery) -> StoreResult<Vec<Task>>;
    /// Reports whether `task` still points at a persisted row.
    fn is_valid(&self, task: &Task) -> StoreResult<bool>;
}
