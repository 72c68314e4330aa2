//! Core logic for the to-do list app.
//! This crate owns the task store, its live queries and the screen controller.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod screen;
pub mod store;

pub use config::{AppConfig, StoreConfig, StoreLocation};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::task::{
    now_epoch_ms, trim_description, NewTask, Task, TaskId, TaskValidationError,
};
pub use screen::{TaskRow, TodoScreen};
pub use store::{
    LiveTasks, SortDirection, SortField, SqliteTaskStore, StoreError, StoreResult, TaskQuery,
    TaskSnapshot, TaskSort, TaskStore,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
