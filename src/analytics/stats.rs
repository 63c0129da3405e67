use std::sync::Arc;

use serde::Serialize;

use crate::{db::FocusSession, log_debug, repository::SessionRepository};

use super::{
    daily::{calculate_daily_data, format_duration, max_daily_minutes, DailyFocus},
    week::week_start,
};

const ENABLE_LOGS: bool = true;

/// Everything the weekly stats view shows for one week.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekStats {
    pub week_offset: i32,
    pub date_range: String,
    pub sessions: Vec<FocusSession>,
    pub total_focus_secs: u64,
    pub total_focus_label: String,
    pub daily: Vec<DailyFocus>,
    pub max_daily_minutes: u64,
}

/// Week navigator over a session repository. Offsets never go past the
/// current week.
pub struct StatsEngine {
    sessions: Arc<dyn SessionRepository>,
    week_offset: i32,
    current: Option<WeekStats>,
}

impl StatsEngine {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            sessions,
            week_offset: 0,
            current: None,
        }
    }

    pub fn week_offset(&self) -> i32 {
        self.week_offset
    }

    pub fn can_go_next(&self) -> bool {
        self.week_offset < 0
    }

    pub fn current(&self) -> Option<&WeekStats> {
        self.current.as_ref()
    }

    /// Jumps straight to `offset`, clamped to the current week.
    pub async fn show_week(&mut self, offset: i32) -> &WeekStats {
        self.week_offset = offset.min(0);
        self.load().await
    }

    pub async fn load(&mut self) -> &WeekStats {
        let repository = &self.sessions;
        let offset = self.week_offset;
        let today = repository.today();

        let sessions = repository.fetch_sessions(offset).await;
        let date_range = repository.week_date_range(offset);
        let total_focus_secs = repository.total_focus_time(&sessions).as_secs();

        let daily = match week_start(today, offset) {
            Some(monday) => calculate_daily_data(&sessions, monday, today),
            None => Vec::new(),
        };

        self.current.insert(WeekStats {
            week_offset: offset,
            date_range,
            total_focus_label: format_duration(total_focus_secs),
            total_focus_secs,
            max_daily_minutes: max_daily_minutes(&daily),
            daily,
            sessions,
        })
    }

    pub async fn previous_week(&mut self) -> &WeekStats {
        self.week_offset = self.week_offset.saturating_sub(1);
        self.load().await
    }

    /// Moves one week forward. Returns `None` without touching anything
    /// when already on the current week.
    pub async fn next_week(&mut self) -> Option<&WeekStats> {
        if !self.can_go_next() {
            log_debug!("Already on the current week");
            return None;
        }
        self.week_offset += 1;
        Some(self.load().await)
    }
}
