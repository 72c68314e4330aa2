//! Task domain model.
//!
//! # Responsibility
//! - Define the single persisted record rendered by the to-do screen.
//! - Validate field-level invariants before persistence.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another task.
//! - `description` is non-empty after trimming.
//! - `created_at` is set once at creation and never changes.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier of one task.
pub type TaskId = Uuid;

/// Field-level validation failures for tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Description is empty or whitespace-only.
    EmptyDescription,
    /// Creation timestamp lies before the unix epoch.
    NegativeCreatedAt(i64),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "description cannot be empty"),
            Self::NegativeCreatedAt(value) => {
                write!(f, "created_at must be >= 0, got {value}")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// Persisted to-do record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Primary key, immutable after creation.
    pub uuid: TaskId,
    /// User-entered text, already trimmed by the screen.
    pub description: String,
    /// Completion flag, the only field the screen mutates.
    pub is_complete: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Task {
    /// Checks field-level invariants.
    ///
    /// # Errors
    /// - `EmptyDescription` when the trimmed `description` is empty.
    /// - `NegativeCreatedAt` when `created_at < 0`.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_fields(self.description.as_str(), self.created_at)
    }
}

/// Field set used to create one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub uuid: TaskId,
    pub description: String,
    pub is_complete: bool,
    pub created_at: i64,
}

impl NewTask {
    /// Builds an incomplete task with a fresh v4 id stamped with the current time.
    pub fn now(description: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            description: description.into(),
            is_complete: false,
            created_at: now_epoch_ms(),
        }
    }

    /// Checks the same invariants as [`Task::validate`].
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_fields(self.description.as_str(), self.created_at)
    }

    pub(crate) fn into_task(self) -> Task {
        Task {
            uuid: self.uuid,
            description: self.description,
            is_complete: self.is_complete,
            created_at: self.created_at,
        }
    }
}

/// Current wall-clock time in unix epoch milliseconds.
///
/// Falls back to `0` if the system clock reports a time before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Strips surrounding whitespace, including the U+FEFF byte-order mark.
pub fn trim_description(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

fn validate_fields(description: &str, created_at: i64) -> Result<(), TaskValidationError> {
    if trim_description(description).is_empty() {
        return Err(TaskValidationError::EmptyDescription);
    }
    if created_at < 0 {
        return Err(TaskValidationError::NegativeCreatedAt(created_at));
    }
    Ok(())
}
