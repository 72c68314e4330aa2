//! Row presentation for the task list.

use crate::model::task::{Task, TaskId};

pub const STATUS_ICON_COMPLETE: &str = "✓";
pub const STATUS_ICON_INCOMPLETE: &str = "○";
pub const DELETE_LABEL: &str = "Delete task";

/// One rendered list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    /// Snapshot the row was rendered from; pass it back to toggle/delete.
    pub task: Task,
    pub status_icon: &'static str,
    /// Accessibility label of the status control.
    pub toggle_label: &'static str,
    pub delete_label: &'static str,
}

impl TaskRow {
    pub fn from_task(task: &Task) -> Self {
        let (status_icon, toggle_label) = if task.is_complete {
            (STATUS_ICON_COMPLETE, "Mark task as incomplete")
        } else {
            (STATUS_ICON_INCOMPLETE, "Mark task as complete")
        };
        Self {
            task: task.clone(),
            status_icon,
            toggle_label,
            delete_label: DELETE_LABEL,
        }
    }

    pub fn id(&self) -> TaskId {
        self.task.uuid
    }

    pub fn description(&self) -> &str {
        &self.task.description
    }

    pub fn is_complete(&self) -> bool {
        self.task.is_complete
    }

    /// Stable list key for host UI diffing.
    pub fn key(&self) -> String {
        self.task.uuid.simple().to_string()
    }

    /// Single-line text rendering, numbered from 1.
    pub fn render_line(&self, position: usize) -> String {
        format!("{position:>3}. {} {}", self.status_icon, self.task.description)
    }
}

pub(crate) fn render_rows(tasks: &[Task]) -> Vec<TaskRow> {
    tasks.iter().map(TaskRow::from_task).collect()
}
