use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, to_i64, to_u64},
    models::FocusSession,
};

fn row_to_session(row: &Row) -> Result<FocusSession> {
    let start_time: String = row.get("start_time")?;
    let duration_seconds: i64 = row.get("duration_seconds")?;

    Ok(FocusSession {
        id: row.get("id")?,
        start_time: parse_datetime(&start_time, "start_time")?,
        duration_seconds: to_u64(duration_seconds, "duration_seconds")?,
        task_title: row.get("task_title")?,
    })
}

impl Database {
    pub async fn insert_focus_session(&self, session: &FocusSession) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO focus_sessions (id, start_time, duration_seconds, task_title)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.id,
                    format_datetime(&record.start_time),
                    to_i64(record.duration_seconds)?,
                    record.task_title,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Sessions with `start <= start_time < end`, oldest first.
    pub async fn list_focus_sessions_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FocusSession>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, start_time, duration_seconds, task_title
                 FROM focus_sessions
                 WHERE start_time >= ?1 AND start_time < ?2
                 ORDER BY start_time ASC",
            )?;

            let mut rows = stmt.query(params![format_datetime(&start), format_datetime(&end)])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }

            Ok(sessions)
        })
        .await
    }

    pub async fn count_focus_sessions(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM focus_sessions", [], |row| row.get(0))?;
            to_u64(count, "count")
        })
        .await
    }

    pub async fn delete_all_focus_sessions(&self) -> Result<usize> {
        self.execute(|conn| Ok(conn.execute("DELETE FROM focus_sessions", [])?))
            .await
    }
}
