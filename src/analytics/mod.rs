//! Weekly focus statistics: week windows, per-day buckets and the week
//! navigator used by the stats view.

pub mod daily;
pub mod stats;
pub mod week;

pub use daily::{
    calculate_daily_data, format_duration, max_daily_minutes, total_focus_time, DailyFocus,
    IntensityBand,
};
pub use stats::{StatsEngine, WeekStats};
pub use week::{week_date_range, week_start, WeekWindow};
