//! Focus session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved stretch of focus time. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSession {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub duration_seconds: u64,
    /// Title of the task at save time. A snapshot, not a reference: later
    /// renames or deletes of the task do not touch it.
    pub task_title: Option<String>,
}

impl FocusSession {
    /// New session stamped with `start_time`, which callers take from their
    /// clock at creation.
    pub fn new(
        start_time: DateTime<Utc>,
        duration_seconds: u64,
        task_title: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            start_time,
            duration_seconds,
            task_title,
        }
    }
}
