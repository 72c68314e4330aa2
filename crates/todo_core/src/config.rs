//! Process configuration resolved at startup.
//!
//! # Responsibility
//! - Resolve database location and logging settings from the environment.
//! - Keep resolution testable through an injectable variable lookup.
//!
//! # Invariants
//! - Blank variables are treated as unset.
//! - Resolution never fails; invalid log levels surface at `init_logging`.

use crate::logging::default_log_level;
use std::path::PathBuf;

/// Environment variable overriding the database file path.
pub const DB_PATH_ENV: &str = "TODO_DB_PATH";
/// Environment variable overriding the log level.
pub const LOG_LEVEL_ENV: &str = "TODO_LOG_LEVEL";
/// Environment variable enabling file logging in the given directory.
pub const LOG_DIR_ENV: &str = "TODO_LOG_DIR";
/// File name used under the temp directory when no path is configured.
pub const DEFAULT_DB_FILE_NAME: &str = "todo.sqlite3";

/// Where the task database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    InMemory,
}

/// Store registration settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: StoreLocation,
}

impl StoreConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::InMemory,
        }
    }
}

/// Full startup configuration for hosts (CLI, FFI).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub log_level: String,
    /// `None` keeps file logging disabled.
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        Self {
            store: StoreConfig::file(db_path),
            log_level: read(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read(LOG_DIR_ENV).map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, StoreLocation, DB_PATH_ENV, DEFAULT_DB_FILE_NAME, LOG_DIR_ENV};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_use_temp_dir_database_and_build_level() {
        let config = AppConfig::from_lookup(lookup_from(&[]));

        assert_eq!(
            config.store.location,
            StoreLocation::File(std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
        );
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn explicit_values_are_trimmed() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (DB_PATH_ENV, "  /data/tasks.db "),
            (LOG_DIR_ENV, "/var/log/todo"),
        ]));

        assert_eq!(
            config.store.location,
            StoreLocation::File(PathBuf::from("/data/tasks.db"))
        );
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/todo")));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[(DB_PATH_ENV, "   ")]));
        assert_eq!(
            config.store.location,
            StoreLocation::File(std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
        );
    }
}
