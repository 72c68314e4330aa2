//! Single-screen to-do controller.
//!
//! # Responsibility
//! - Own transient input state for the add form.
//! - Map submit/toggle/delete gestures onto store transactions.
//! - Keep newest-first rows in step with the store's live query.
//!
//! # Invariants
//! - Empty or whitespace-only input never reaches the store.
//! - Toggle/delete on a stale task is a silent no-op.
//! - The live query is released when the screen is dropped.

use crate::model::task::{trim_description, NewTask, Task, TaskId};
use crate::store::{LiveTasks, StoreResult, TaskQuery, TaskStore};
use log::debug;

mod row;

pub use row::{TaskRow, DELETE_LABEL, STATUS_ICON_COMPLETE, STATUS_ICON_INCOMPLETE};

pub const SCREEN_TITLE: &str = "To-Do";
pub const SCREEN_SUBTITLE: &str = "Fast, offline, and clean.";
pub const INPUT_PLACEHOLDER: &str = "Add a new task...";

/// Controller for the task list screen.
///
/// Borrows the store for its whole lifetime; the store handle is injected by
/// the host rather than looked up globally.
pub struct TodoScreen<'s, S: TaskStore> {
    store: &'s S,
    input_text: String,
    tasks: LiveTasks,
    rows: Vec<TaskRow>,
}

impl<'s, S: TaskStore> TodoScreen<'s, S> {
    /// Subscribes to tasks in newest-first order and renders initial rows.
    pub fn new(store: &'s S) -> StoreResult<Self> {
        let tasks = store.query(TaskQuery::newest_first())?;
        let rows = row::render_rows(tasks.tasks());
        debug!(
            "event=screen_open module=screen status=ok rows={}",
            rows.len()
        );
        Ok(Self {
            store,
            input_text: String::new(),
            tasks,
            rows,
        })
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn set_input_text(&mut self, text: impl Into<String>) {
        self.input_text = text.into();
    }

    /// Creates a task from the trimmed input.
    ///
    /// Returns `Ok(None)` without touching the store when the trimmed input
    /// is empty. The input is cleared only after a successful create.
    ///
    /// `created_at` never precedes the newest listed task, so the new row
    /// lands on top even after the wall clock steps backwards.
    pub fn submit(&mut self) -> StoreResult<Option<Task>> {
        let description = trim_description(&self.input_text);
        if description.is_empty() {
            debug!("event=task_add module=screen status=skipped reason=empty_input");
            return Ok(None);
        }

        let mut fields = NewTask::now(description);
        fields.created_at = self.next_created_at(fields.created_at);
        let task = self.store.create(fields)?;
        self.input_text.clear();
        self.refresh();
        Ok(Some(task))
    }

    fn next_created_at(&mut self, now: i64) -> i64 {
        self.refresh();
        match self.rows.first() {
            Some(newest) if newest.task.created_at > now => {
                debug!(
                    "event=task_add module=screen status=clamped clock_ms={now} newest_ms={}",
                    newest.task.created_at
                );
                newest.task.created_at
            }
            _ => now,
        }
    }

    /// Flips completion of `task`. Returns `Ok(false)` for stale references.
    pub fn toggle(&mut self, task: &Task) -> StoreResult<bool> {
        if !self.store.is_valid(task)? {
            debug!(
                "event=task_toggle module=screen status=skipped reason=stale task_id={}",
                task.uuid
            );
            self.refresh();
            return Ok(false);
        }

        self.store
            .update(task, |current| current.is_complete = !current.is_complete)?;
        self.refresh();
        Ok(true)
    }

    /// Deletes `task`. Returns `Ok(false)` for stale references.
    pub fn delete(&mut self, task: &Task) -> StoreResult<bool> {
        if !self.store.is_valid(task)? {
            debug!(
                "event=task_delete module=screen status=skipped reason=stale task_id={}",
                task.uuid
            );
            self.refresh();
            return Ok(false);
        }

        self.store.delete(task)?;
        self.refresh();
        Ok(true)
    }

    /// Applies pending live-query snapshots and re-renders rows.
    ///
    /// Returns `true` when rows changed. Gesture methods call this
    /// themselves; hosts call it to pick up writes made elsewhere.
    pub fn refresh(&mut self) -> bool {
        if !self.tasks.refresh() {
            return false;
        }
        self.rows = row::render_rows(self.tasks.tasks());
        debug!(
            "event=screen_render module=screen status=ok revision={} rows={}",
            self.tasks.revision(),
            self.rows.len()
        );
        true
    }

    /// Rows in display order (newest first).
    pub fn rows(&self) -> &[TaskRow] {
        &self.rows
    }

    /// Looks up the row currently showing task `id`.
    pub fn find_row(&self, id: TaskId) -> Option<&TaskRow> {
        self.rows.iter().find(|row| row.id() == id)
    }

    /// Plain-text rendering of the whole screen.
    pub fn render_text(&self) -> String {
        let mut lines = vec![
            SCREEN_TITLE.to_string(),
            SCREEN_SUBTITLE.to_string(),
            String::new(),
        ];
        if self.input_text.is_empty() {
            lines.push(format!("> {INPUT_PLACEHOLDER}"));
        } else {
            lines.push(format!("> {}", self.input_text));
        }
        lines.push(String::new());
        lines.extend(
            self.rows
                .iter()
                .enumerate()
                .map(|(index, row)| row.render_line(index + 1)),
        );
        lines.join("\n")
    }
}
