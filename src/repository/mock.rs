//! Demo/fixture data: a few weeks of plausible focus sessions.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use rand::Rng;

use crate::{db::FocusSession, log_info, log_warn};

use super::SessionRepository;

const ENABLE_LOGS: bool = true;

const MAX_SESSIONS_PER_DAY: u32 = 4;
const EARLIEST_HOUR: u32 = 6;
const LATEST_HOUR: u32 = 22;
const MIN_MINUTES: u64 = 15;
const MAX_MINUTES: u64 = 120;

/// For each of the `weeks * 7` days ending today, 0 to 4 sessions at a
/// random time between 06:00 and 22:59, each 15 to 120 whole minutes.
pub fn build_mock_sessions<R: Rng>(
    now: DateTime<Utc>,
    weeks: u32,
    rng: &mut R,
) -> Vec<FocusSession> {
    let today = now.with_timezone(&Local).date_naive();
    let mut sessions = Vec::new();

    for days_ago in 0..i64::from(weeks) * 7 {
        let Some(date) = today.checked_sub_signed(Duration::days(days_ago)) else {
            continue;
        };

        let session_count = rng.gen_range(0..=MAX_SESSIONS_PER_DAY);
        for _ in 0..session_count {
            let hour = rng.gen_range(EARLIEST_HOUR..=LATEST_HOUR);
            let minute = rng.gen_range(0..=59);

            let Some(start) = date
                .and_hms_opt(hour, minute, 0)
                .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            else {
                continue;
            };

            let duration_seconds = rng.gen_range(MIN_MINUTES..=MAX_MINUTES) * 60;
            sessions.push(FocusSession::new(
                start.with_timezone(&Utc),
                duration_seconds,
                None,
            ));
        }
    }

    sessions
}

/// Inserts mock sessions through `repository`. Individual failures are
/// logged and skipped; returns how many were stored.
pub async fn generate_mock_data(
    repository: &dyn SessionRepository,
    sessions: Vec<FocusSession>,
) -> usize {
    let mut stored = 0;
    for session in &sessions {
        match repository.save(session).await {
            Ok(()) => stored += 1,
            Err(err) => log_warn!("Skipping mock session {}: {err}", session.id),
        }
    }
    log_info!("Generated {stored} mock sessions");
    stored
}
