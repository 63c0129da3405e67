//! Persistence contracts consumed by the coordinator and the stats engine.
//!
//! Writes report [`PersistenceError`]; reads never fail outward and fall
//! back to an empty collection (logged).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    analytics::{self, WeekWindow},
    db::{FocusSession, TaskItem},
    error::PersistenceError,
    log_warn,
};

mod memory;
pub mod mock;
mod sqlite;

pub use memory::{MemorySessionStore, MemoryTaskStore};
pub use mock::{build_mock_sessions, generate_mock_data};
pub use sqlite::{SqliteSessionRepository, SqliteTaskRepository};

const ENABLE_LOGS: bool = true;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn save(&self, session: &FocusSession) -> Result<(), PersistenceError>;

    /// Sessions with `start <= start_time < end`, ordered by start time.
    async fn fetch_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FocusSession>, PersistenceError>;

    async fn delete_all(&self) -> Result<(), PersistenceError>;

    /// Local calendar date that week offsets are measured from.
    fn today(&self) -> NaiveDate;

    /// Sessions of the Monday-aligned week `week_offset` weeks from the
    /// current one. Empty on any failure.
    async fn fetch_sessions(&self, week_offset: i32) -> Vec<FocusSession> {
        let Some(window) = WeekWindow::for_offset(self.today(), week_offset) else {
            log_warn!("No week window for offset {week_offset}");
            return Vec::new();
        };

        match self.fetch_between(window.start, window.end).await {
            Ok(sessions) => sessions,
            Err(err) => {
                log_warn!("Failed to fetch sessions for week {week_offset}: {err}");
                Vec::new()
            }
        }
    }

    fn total_focus_time(&self, sessions: &[FocusSession]) -> Duration {
        analytics::total_focus_time(sessions)
    }

    fn week_date_range(&self, offset: i32) -> String {
        analytics::week_date_range(self.today(), offset)
    }
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// All tasks, newest first. Empty on failure.
    async fn fetch_all(&self) -> Vec<TaskItem>;

    async fn save(&self, task: &TaskItem) -> Result<(), PersistenceError>;

    /// Deleting a task that is already gone succeeds.
    async fn delete(&self, task_id: &str) -> Result<(), PersistenceError>;

    /// Returns the new completion flag.
    async fn toggle_completion(&self, task_id: &str) -> Result<bool, PersistenceError>;

    /// Returns how many tasks were removed.
    async fn delete_completed(&self) -> Result<usize, PersistenceError>;
}
