//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the to-do screen gestures to Dart via FRB.
//! - Keep error semantics simple: envelopes carry `ok` plus a message.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call goes through `TodoScreen`, so trimming and stale-reference
//!   guards match the native front-end.

use log::warn;
use std::sync::OnceLock;
#[cfg(not(test))]
use todo_core::AppConfig;
use todo_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    SqliteTaskStore, StoreConfig, TaskId, TaskRow, TodoScreen,
};

static STORE_CONFIG: OnceLock<StoreConfig> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One list row as shown by the Flutter screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRowView {
    /// Stable task ID in hyphenated string form.
    pub task_id: String,
    pub description: String,
    pub is_complete: bool,
    /// `✓` or `○`.
    pub status_icon: String,
    /// Accessibility label for the status control.
    pub toggle_label: String,
    pub created_at: i64,
}

/// Newest-first list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListResponse {
    pub ok: bool,
    pub items: Vec<TodoRowView>,
    /// Human-readable diagnostics message.
    pub message: String,
}

/// Gesture result envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoActionResponse {
    /// Whether the call completed without a store failure.
    pub ok: bool,
    /// Whether the store was actually changed (`false` for guarded no-ops).
    pub changed: bool,
    /// Created task ID for `todo_add`.
    pub task_id: Option<String>,
    pub message: String,
}

impl TodoActionResponse {
    fn changed(message: impl Into<String>, task_id: Option<String>) -> Self {
        Self {
            ok: true,
            changed: true,
            task_id,
            message: message.into(),
        }
    }

    fn unchanged(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            changed: false,
            task_id: None,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            task_id: None,
            message: message.into(),
        }
    }
}

/// Lists tasks newest first.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_list() -> TodoListResponse {
    match with_screen(|screen| Ok(screen.rows().iter().map(to_row_view).collect::<Vec<_>>())) {
        Ok(items) => {
            let message = if items.is_empty() {
                "No tasks.".to_string()
            } else {
                format!("{} task(s).", items.len())
            };
            TodoListResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error action=todo_list");
            TodoListResponse {
                ok: false,
                items: Vec::new(),
                message: format!("todo_list failed: {err}"),
            }
        }
    }
}

/// Adds a task from the input field text.
///
/// # FFI contract
/// - Blank text is a successful no-op (`changed=false`).
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_add(text: String) -> TodoActionResponse {
    let result = with_screen(|screen| {
        screen.set_input_text(text);
        screen.submit()
    });
    match result {
        Ok(Some(task)) => {
            TodoActionResponse::changed("Task added.", Some(task.uuid.to_string()))
        }
        Ok(None) => TodoActionResponse::unchanged("Nothing to add."),
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error action=todo_add");
            TodoActionResponse::failure(format!("todo_add failed: {err}"))
        }
    }
}

/// Flips completion of the task with `task_id`.
///
/// # FFI contract
/// - Unknown or already-deleted IDs are a successful no-op.
/// - Malformed IDs return `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_toggle(task_id: String) -> TodoActionResponse {
    run_row_action("todo_toggle", task_id, "Task updated.", |screen, row| {
        screen.toggle(&row.task)
    })
}

/// Deletes the task with `task_id`.
///
/// # FFI contract
/// - Unknown or already-deleted IDs are a successful no-op.
/// - Malformed IDs return `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_delete(task_id: String) -> TodoActionResponse {
    run_row_action("todo_delete", task_id, "Task deleted.", |screen, row| {
        screen.delete(&row.task)
    })
}

fn run_row_action(
    action: &str,
    task_id: String,
    success_message: &str,
    gesture: impl FnOnce(&mut TodoScreen<'_, SqliteTaskStore>, TaskRow) -> todo_core::StoreResult<bool>,
) -> TodoActionResponse {
    let id = match TaskId::parse_str(task_id.trim()) {
        Ok(id) => id,
        Err(_) => {
            return TodoActionResponse::failure(format!("{action} failed: invalid task id"));
        }
    };

    let result = with_screen(|screen| match screen.find_row(id).cloned() {
        Some(row) => gesture(screen, row),
        None => Ok(false),
    });
    match result {
        Ok(true) => TodoActionResponse::changed(success_message, Some(id.to_string())),
        Ok(false) => TodoActionResponse::unchanged("Task no longer exists."),
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error action={action}");
            TodoActionResponse::failure(format!("{action} failed: {err}"))
        }
    }
}

fn resolve_store_config() -> &'static StoreConfig {
    STORE_CONFIG.get_or_init(default_store_config)
}

#[cfg(not(test))]
fn default_store_config() -> StoreConfig {
    AppConfig::from_env().store
}

#[cfg(test)]
fn default_store_config() -> StoreConfig {
    StoreConfig::file(tests::isolated_db_path())
}

fn with_screen<T>(
    f: impl FnOnce(&mut TodoScreen<'_, SqliteTaskStore>) -> todo_core::StoreResult<T>,
) -> Result<T, String> {
    let store = SqliteTaskStore::open(resolve_store_config())
        .map_err(|err| format!("todo store open failed: {err}"))?;
    let mut screen =
        TodoScreen::new(&store).map_err(|err| format!("todo screen init failed: {err}"))?;
    f(&mut screen).map_err(|err| err.to_string())
}

fn to_row_view(row: &TaskRow) -> TodoRowView {
    TodoRowView {
        task_id: row.id().to_string(),
        description: row.description().to_string(),
        is_complete: row.is_complete(),
        status_icon: row.status_icon.to_string(),
        toggle_label: row.toggle_label.to_string(),
        created_at: row.task.created_at,
    }
}
