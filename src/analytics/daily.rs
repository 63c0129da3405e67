use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::FocusSession;

use super::week::{local_date, DAYS_IN_WEEK};

pub const DAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Daily total that counts as full intensity (four hours).
pub const INTENSITY_SCALE_MINUTES: u64 = 240;

/// Display emphasis for a day, from `total_minutes / 240`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IntensityBand {
    Minimal,
    Light,
    Moderate,
    High,
    Peak,
}

impl IntensityBand {
    pub fn from_minutes(total_minutes: u64) -> Self {
        let ratio = total_minutes as f64 / INTENSITY_SCALE_MINUTES as f64;
        if ratio > 0.7 {
            IntensityBand::Peak
        } else if ratio > 0.5 {
            IntensityBand::High
        } else if ratio > 0.3 {
            IntensityBand::Moderate
        } else if ratio > 0.1 {
            IntensityBand::Light
        } else {
            IntensityBand::Minimal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyFocus {
    pub day_label: String,
    pub date: NaiveDate,
    /// Whole minutes; partial minutes are dropped.
    pub total_minutes: u64,
    pub is_today: bool,
    pub intensity: IntensityBand,
}

impl DailyFocus {
    pub fn formatted_time(&self) -> String {
        format_duration(self.total_minutes * 60)
    }

    /// Bar height relative to the busiest day.
    pub fn height_ratio(&self, max_minutes: u64) -> f64 {
        if max_minutes == 0 {
            return 0.0;
        }
        self.total_minutes as f64 / max_minutes as f64
    }
}

/// Buckets `sessions` into the seven local calendar days starting at
/// `week_start`. Sessions outside the week are ignored.
pub fn calculate_daily_data(
    sessions: &[FocusSession],
    week_start: NaiveDate,
    today: NaiveDate,
) -> Vec<DailyFocus> {
    let mut seconds_per_day = [0u64; DAYS_IN_WEEK as usize];
    for session in sessions {
        let day_index = (local_date(&session.start_time) - week_start).num_days();
        if (0..DAYS_IN_WEEK).contains(&day_index) {
            let bucket = &mut seconds_per_day[day_index as usize];
            *bucket = bucket.saturating_add(session.duration_seconds);
        }
    }

    seconds_per_day
        .iter()
        .zip(DAY_LABELS)
        .zip(week_start.iter_days())
        .map(|((seconds, label), date)| {
            let total_minutes = seconds / 60;
            DailyFocus {
                day_label: label.to_string(),
                date,
                total_minutes,
                is_today: date == today,
                intensity: IntensityBand::from_minutes(total_minutes),
            }
        })
        .collect()
}

/// Largest daily total, or 1 when every day is empty, so it is always safe
/// to divide by.
pub fn max_daily_minutes(days: &[DailyFocus]) -> u64 {
    days.iter()
        .map(|day| day.total_minutes)
        .max()
        .filter(|max| *max > 0)
        .unwrap_or(1)
}

pub fn total_focus_time(sessions: &[FocusSession]) -> Duration {
    Duration::from_secs(
        sessions
            .iter()
            .fold(0u64, |total, session| total.saturating_add(session.duration_seconds)),
    )
}

/// `"1h 05m"` once there is at least an hour, otherwise `"25m"`.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else {
        format!("{minutes}m")
    }
}
