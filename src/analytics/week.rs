//! Monday-aligned week windows.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde::Serialize;

pub const DAYS_IN_WEEK: i64 = 7;

/// Shown when a week window cannot be computed.
pub const FALLBACK_RANGE_LABEL: &str = "Select Week";

/// Days from `weekday` back to the Monday of the same week.
pub fn days_to_monday(weekday: Weekday) -> i64 {
    match weekday {
        Weekday::Sun => -6,
        other => -i64::from(other.num_days_from_monday()),
    }
}

/// Monday of the week `offset` weeks away from the week containing
/// `today` (0 = this week, negative = past weeks).
pub fn week_start(today: NaiveDate, offset: i32) -> Option<NaiveDate> {
    let shift = days_to_monday(today.weekday()) + i64::from(offset) * DAYS_IN_WEEK;
    today.checked_add_signed(Duration::days(shift))
}

/// Local midnight at the start of `date`, as a UTC instant. Falls back to
/// the first valid local time when midnight is skipped by a DST change.
pub fn local_midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
}

/// Local calendar day a UTC instant falls on.
pub fn local_date(instant: &DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekWindow {
    pub offset: i32,
    pub monday: NaiveDate,
    /// Local midnight of `monday`.
    pub start: DateTime<Utc>,
    /// Exclusive end: local midnight of the following Monday.
    pub end: DateTime<Utc>,
}

impl WeekWindow {
    pub fn for_offset(today: NaiveDate, offset: i32) -> Option<Self> {
        let monday = week_start(today, offset)?;
        let next_monday = monday.checked_add_signed(Duration::days(DAYS_IN_WEEK))?;
        Some(Self {
            offset,
            monday,
            start: local_midnight(monday)?,
            end: local_midnight(next_monday)?,
        })
    }

    pub fn sunday(&self) -> NaiveDate {
        self.monday + Duration::days(DAYS_IN_WEEK - 1)
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start && *instant < self.end
    }
}

/// "MMM d - MMM d" for the Monday to Sunday span of the given week.
pub fn week_date_range(today: NaiveDate, offset: i32) -> String {
    let Some(monday) = week_start(today, offset) else {
        return FALLBACK_RANGE_LABEL.to_string();
    };
    let Some(sunday) = monday.checked_add_signed(Duration::days(DAYS_IN_WEEK - 1)) else {
        return FALLBACK_RANGE_LABEL.to_string();
    };

    format!("{} - {}", monday.format("%b %-d"), sunday.format("%b %-d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn days_to_monday_matches_calendar() {
        assert_eq!(days_to_monday(Weekday::Mon), 0);
        assert_eq!(days_to_monday(Weekday::Tue), -1);
        assert_eq!(days_to_monday(Weekday::Wed), -2);
        assert_eq!(days_to_monday(Weekday::Sat), -5);
        assert_eq!(days_to_monday(Weekday::Sun), -6);
    }

    #[test]
    fn every_day_of_a_week_maps_to_its_monday() {
        // 2024-01-15 is a Monday.
        for day in 15..=21 {
            assert_eq!(week_start(date(2024, 1, day), 0), Some(date(2024, 1, 15)));
        }
        assert_eq!(week_start(date(2024, 1, 22), 0), Some(date(2024, 1, 22)));
    }

    #[test]
    fn offsets_shift_by_whole_weeks() {
        let today = date(2024, 1, 17);
        assert_eq!(week_start(today, -1), Some(date(2024, 1, 8)));
        assert_eq!(week_start(today, -3), Some(date(2023, 12, 25)));
        assert_eq!(week_start(today, 1), Some(date(2024, 1, 22)));
    }

    #[test]
    fn range_label_spans_monday_to_sunday() {
        assert_eq!(week_date_range(date(2024, 1, 17), 0), "Jan 15 - Jan 21");
        assert_eq!(week_date_range(date(2024, 1, 21), 0), "Jan 15 - Jan 21");
        assert_eq!(week_date_range(date(2024, 1, 3), -1), "Dec 25 - Dec 31");
        assert_eq!(week_date_range(date(2024, 2, 28), 0), "Feb 26 - Mar 3");
    }

    #[test]
    fn range_label_falls_back_at_calendar_edge() {
        assert_eq!(week_date_range(NaiveDate::MAX, 1), FALLBACK_RANGE_LABEL);
    }

    #[test]
    fn window_is_half_open_over_seven_local_days() {
        let window = WeekWindow::for_offset(date(2024, 1, 17), 0).unwrap();
        assert_eq!(window.monday, date(2024, 1, 15));
        assert_eq!(window.sunday(), date(2024, 1, 21));
        assert_eq!(local_date(&window.start), date(2024, 1, 15));
        assert_eq!(local_date(&window.end), date(2024, 1, 22));
        assert!(window.contains(&window.start));
        assert!(!window.contains(&window.end));
        assert!(window.contains(&(window.end - Duration::seconds(1))));
    }

    #[test]
    fn current_week_contains_today() {
        let today = Local::now().date_naive();
        let window = WeekWindow::for_offset(today, 0).unwrap();
        assert!(window.monday <= today && today <= window.sunday());

        let label = week_date_range(today, 0);
        assert_eq!(
            label,
            format!(
                "{} - {}",
                window.monday.format("%b %-d"),
                window.sunday().format("%b %-d")
            )
        );
    }
}
