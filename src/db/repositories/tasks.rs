use anyhow::{anyhow, Result};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime},
    models::TaskItem,
};

fn row_to_task(row: &Row) -> Result<TaskItem> {
    let created_at: String = row.get("created_at")?;
    let duration_minutes: i64 = row.get("duration_minutes")?;

    Ok(TaskItem {
        id: row.get("id")?,
        title: row.get("title")?,
        duration_minutes: u32::try_from(duration_minutes)
            .map_err(|_| anyhow!("duration_minutes out of range: {duration_minutes}"))?,
        is_completed: row.get("is_completed")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    /// Inserts `task`, or overwrites the stored row with the same id.
    pub async fn upsert_task(&self, task: &TaskItem) -> Result<()> {
        let record = task.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO tasks (id, title, duration_minutes, is_completed, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     title = excluded.title,
                     duration_minutes = excluded.duration_minutes,
                     is_completed = excluded.is_completed,
                     created_at = excluded.created_at",
                params![
                    record.id,
                    record.title,
                    i64::from(record.duration_minutes),
                    record.is_completed,
                    format_datetime(&record.created_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// All tasks, most recently created first.
    pub async fn list_tasks(&self) -> Result<Vec<TaskItem>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, duration_minutes, is_completed, created_at
                 FROM tasks
                 ORDER BY created_at DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut tasks = Vec::new();
            while let Some(row) = rows.next()? {
                tasks.push(row_to_task(row)?);
            }

            Ok(tasks)
        })
        .await
    }

    /// Returns the number of rows removed (0 when the task was already gone).
    pub async fn delete_task(&self, task_id: &str) -> Result<usize> {
        let task_id = task_id.to_string();
        self.execute(move |conn| {
            Ok(conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?)
        })
        .await
    }

    /// Flips the completion flag and returns the new value, or `None` if no
    /// task has that id.
    pub async fn toggle_task_completion(&self, task_id: &str) -> Result<Option<bool>> {
        let task_id = task_id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE tasks SET is_completed = NOT is_completed WHERE id = ?1",
                params![task_id],
            )?;
            if rows_affected == 0 {
                return Ok(None);
            }

            let is_completed: bool = conn.query_row(
                "SELECT is_completed FROM tasks WHERE id = ?1",
                params![task_id],
                |row| row.get(0),
            )?;
            Ok(Some(is_completed))
        })
        .await
    }

    pub async fn delete_completed_tasks(&self) -> Result<usize> {
        self.execute(|conn| Ok(conn.execute("DELETE FROM tasks WHERE is_completed = 1", [])?))
            .await
    }
}
