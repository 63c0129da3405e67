use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    clock::Clock,
    db::{Database, FocusSession, TaskItem},
    error::PersistenceError,
    log_info, log_warn,
};

use super::{SessionRepository, TaskRepository};

const ENABLE_LOGS: bool = true;

#[derive(Clone)]
pub struct SqliteSessionRepository {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl SqliteSessionRepository {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn save(&self, session: &FocusSession) -> Result<(), PersistenceError> {
        self.db.insert_focus_session(session).await?;
        Ok(())
    }

    async fn fetch_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FocusSession>, PersistenceError> {
        Ok(self.db.list_focus_sessions_between(start, end).await?)
    }

    async fn delete_all(&self) -> Result<(), PersistenceError> {
        let removed = self.db.delete_all_focus_sessions().await?;
        log_info!("Deleted {removed} focus sessions");
        Ok(())
    }

    fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}

#[derive(Clone)]
pub struct SqliteTaskRepository {
    db: Database,
}

impl SqliteTaskRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn fetch_all(&self) -> Vec<TaskItem> {
        match self.db.list_tasks().await {
            Ok(tasks) => tasks,
            Err(err) => {
                log_warn!("Failed to load tasks: {err:#}");
                Vec::new()
            }
        }
    }

    async fn save(&self, task: &TaskItem) -> Result<(), PersistenceError> {
        self.db.upsert_task(task).await?;
        Ok(())
    }

    async fn delete(&self, task_id: &str) -> Result<(), PersistenceError> {
        self.db.delete_task(task_id).await?;
        Ok(())
    }

    async fn toggle_completion(&self, task_id: &str) -> Result<bool, PersistenceError> {
        self.db
            .toggle_task_completion(task_id)
            .await?
            .ok_or_else(|| PersistenceError::NotFound {
                id: task_id.to_string(),
            })
    }

    async fn delete_completed(&self) -> Result<usize, PersistenceError> {
        Ok(self.db.delete_completed_tasks().await?)
    }
}
