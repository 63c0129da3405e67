use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerPhase {
    #[default]
    Idle,
    Running,
    Paused,
}

impl TimerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Idle => "Idle",
            TimerPhase::Running => "Running",
            TimerPhase::Paused => "Paused",
        }
    }

    /// Running or paused, i.e. a countdown exists that has not been
    /// stopped or finished.
    pub fn is_active(&self) -> bool {
        matches!(self, TimerPhase::Running | TimerPhase::Paused)
    }
}

/// Ephemeral countdown state. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub phase: TimerPhase,
    pub time_left_secs: u64,
    /// Duration the current or most recent run was configured with.
    pub initial_duration_secs: u64,
    /// Wall-clock start of the current running window. Cleared on pause
    /// and stop, so it only ever covers time since the last start/resume.
    pub session_started_at: Option<DateTime<Utc>>,
}

impl TimerState {
    pub fn new(default_duration_secs: u64) -> Self {
        Self {
            phase: TimerPhase::Idle,
            time_left_secs: default_duration_secs,
            initial_duration_secs: default_duration_secs,
            session_started_at: None,
        }
    }

    pub fn progress(&self) -> f64 {
        if self.initial_duration_secs == 0 {
            return 0.0;
        }
        1.0 - (self.time_left_secs as f64 / self.initial_duration_secs as f64)
    }

    /// `MM:SS`; minutes keep counting past 59 rather than rolling into hours.
    pub fn time_formatted(&self) -> String {
        let minutes = self.time_left_secs / 60;
        let seconds = self.time_left_secs % 60;
        format!("{minutes:02}:{seconds:02}")
    }

    /// Wall-clock time since the running window began. Negative deltas
    /// (clock moved backwards) count as zero.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Duration {
        self.session_started_at
            .map(|started| (now - started).to_std().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn begin_run(&mut self, duration_secs: u64, now: DateTime<Utc>) {
        *self = Self {
            phase: TimerPhase::Running,
            time_left_secs: duration_secs,
            initial_duration_secs: duration_secs,
            session_started_at: Some(now),
        };
    }

    pub fn reset(&mut self, default_duration_secs: u64) {
        *self = Self::new(default_duration_secs);
    }
}
