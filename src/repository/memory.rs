use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    clock::Clock,
    db::{FocusSession, TaskItem},
    error::PersistenceError,
};

use super::{SessionRepository, TaskRepository};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Session store kept in process memory. Writes can be made to fail on
/// demand to exercise best-effort save paths.
pub struct MemorySessionStore {
    sessions: Mutex<Vec<FocusSession>>,
    clock: Arc<dyn Clock>,
    reject_writes: AtomicBool,
}

impl MemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            clock,
            reject_writes: AtomicBool::new(false),
        }
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Everything stored, in insertion order.
    pub fn all(&self) -> Vec<FocusSession> {
        lock(&self.sessions).clone()
    }

    fn check_writable(&self) -> Result<(), PersistenceError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Store(anyhow!("store is read-only")));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for MemorySessionStore {
    async fn save(&self, session: &FocusSession) -> Result<(), PersistenceError> {
        self.check_writable()?;
        lock(&self.sessions).push(session.clone());
        Ok(())
    }

    async fn fetch_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FocusSession>, PersistenceError> {
        let mut matching: Vec<FocusSession> = lock(&self.sessions)
            .iter()
            .filter(|session| session.start_time >= start && session.start_time < end)
            .cloned()
            .collect();
        matching.sort_by_key(|session| session.start_time);
        Ok(matching)
    }

    async fn delete_all(&self) -> Result<(), PersistenceError> {
        self.check_writable()?;
        lock(&self.sessions).clear();
        Ok(())
    }

    fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}

#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<Vec<TaskItem>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskStore {
    async fn fetch_all(&self) -> Vec<TaskItem> {
        let mut tasks = lock(&self.tasks).clone();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    async fn save(&self, task: &TaskItem) -> Result<(), PersistenceError> {
        let mut tasks = lock(&self.tasks);
        match tasks.iter_mut().find(|existing| existing.id == task.id) {
            Some(existing) => *existing = task.clone(),
            None => tasks.push(task.clone()),
        }
        Ok(())
    }

    async fn delete(&self, task_id: &str) -> Result<(), PersistenceError> {
        lock(&self.tasks).retain(|task| task.id != task_id);
        Ok(())
    }

    async fn toggle_completion(&self, task_id: &str) -> Result<bool, PersistenceError> {
        let mut tasks = lock(&self.tasks);
        let task = tasks
            .iter_mut()
            .find(|task| task.id == task_id)
            .ok_or_else(|| PersistenceError::NotFound {
                id: task_id.to_string(),
            })?;
        task.is_completed = !task.is_completed;
        Ok(task.is_completed)
    }

    async fn delete_completed(&self) -> Result<usize, PersistenceError> {
        let mut tasks = lock(&self.tasks);
        let before = tasks.len();
        tasks.retain(|task| !task.is_completed);
        Ok(before - tasks.len())
    }
}
