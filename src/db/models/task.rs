//! Task list entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TaskInputError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    /// Planned focus length.
    pub duration_minutes: u32,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl TaskItem {
    pub fn new(title: String, duration_minutes: u32, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            duration_minutes,
            is_completed: false,
            created_at,
        }
    }

    pub fn duration_secs(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }
}

/// Validated input for a new task. Titles are trimmed; blank titles and
/// zero-minute durations are refused here rather than by [`TaskItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub title: String,
    pub duration_minutes: u32,
}

impl TaskInput {
    pub fn new(title: &str, duration_minutes: u32) -> Result<Self, TaskInputError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TaskInputError::EmptyTitle);
        }
        if duration_minutes == 0 {
            return Err(TaskInputError::ZeroDuration);
        }
        Ok(Self {
            title: title.to_string(),
            duration_minutes,
        })
    }

    pub fn into_task(self, created_at: DateTime<Utc>) -> TaskItem {
        TaskItem::new(self.title, self.duration_minutes, created_at)
    }
}
