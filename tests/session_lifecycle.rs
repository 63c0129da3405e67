//! End-to-end focus session flows against a file-backed SQLite store.

use std::sync::Arc;

use chrono::{Local, TimeZone, Utc};
use tempfile::TempDir;

use orbit::{
    clock::{Clock, ManualClock},
    coordinator::{FocusCoordinator, FocusModeService, Repositories},
    db::Database,
    repository::{SessionRepository, SqliteSessionRepository, SqliteTaskRepository},
    settings::FocusConfig,
    timer::{ManualTicker, TimerPhase},
};

struct App {
    coordinator: FocusCoordinator,
    clock: Arc<ManualClock>,
    sessions: Arc<SqliteSessionRepository>,
    focus_mode: Arc<FocusModeService>,
    _dir: TempDir,
}

fn app() -> App {
    let dir = TempDir::new().unwrap();
    let start = Local
        .with_ymd_and_hms(2024, 1, 17, 10, 0, 0)
        .earliest()
        .unwrap()
        .with_timezone(&Utc);
    let clock = Arc::new(ManualClock::new(start));
    let db = Database::new(dir.path().join("orbit.sqlite3")).unwrap();
    let sessions = Arc::new(SqliteSessionRepository::new(db.clone(), clock.clone()));
    let focus_mode = Arc::new(FocusModeService::new(true));

    let coordinator = FocusCoordinator::new(
        FocusConfig::default(),
        clock.clone(),
        Box::new(ManualTicker::new()),
        Repositories {
            sessions: sessions.clone(),
            tasks: Arc::new(SqliteTaskRepository::new(db)),
        },
        focus_mode.clone(),
    );

    App {
        coordinator,
        clock,
        sessions,
        focus_mode,
        _dir: dir,
    }
}

impl App {
    fn run_for(&mut self, secs: u64) {
        for _ in 0..secs {
            self.clock.advance_secs(1);
            self.coordinator.on_heartbeat();
        }
    }

    async fn this_week(&mut self) -> Vec<orbit::FocusSession> {
        self.coordinator.flush_saves().await;
        self.sessions.fetch_sessions(0).await
    }
}

#[tokio::test]
async fn fifty_nine_seconds_is_not_a_session() {
    let mut app = app();
    app.coordinator.start_focus_session(Some(1500));
    app.run_for(59);
    app.coordinator.pause_session();

    assert_eq!(app.coordinator.timer().phase(), TimerPhase::Paused);
    assert_eq!(app.coordinator.timer().time_left_secs(), 1441);
    assert!(app.this_week().await.is_empty());
}

#[tokio::test]
async fn sixty_seconds_is_persisted() {
    let mut app = app();
    let started = app.clock.now();
    app.coordinator.start_focus_session(Some(1500));
    app.run_for(60);
    app.coordinator.pause_session();

    let saved = app.this_week().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].duration_seconds, 60);
    assert_eq!(saved[0].start_time, started);
}

#[tokio::test]
async fn natural_completion_returns_to_idle_with_one_record() {
    let mut app = app();
    app.coordinator.start_focus_session(Some(60));
    assert!(app.focus_mode.is_focus_active());

    app.run_for(61);

    let timer = app.coordinator.timer();
    assert_eq!(timer.phase(), TimerPhase::Idle);
    assert_eq!(timer.time_left_secs(), 1500);
    assert_eq!(timer.initial_duration_secs(), 1500);
    assert!(timer.session_started_at().is_none());
    assert!(!app.focus_mode.is_focus_active());
    assert_eq!(app.this_week().await.len(), 1);
}

#[tokio::test]
async fn heartbeats_after_stop_change_nothing() {
    let mut app = app();
    app.coordinator.start_focus_session(None);
    app.run_for(10);
    app.coordinator.stop_session();
    app.run_for(5);

    assert_eq!(app.coordinator.timer().phase(), TimerPhase::Idle);
    assert_eq!(app.coordinator.timer().time_left_secs(), 1500);
    assert!(app.this_week().await.is_empty());
}

#[tokio::test]
async fn task_session_records_task_title() {
    let mut app = app();
    let task = app.coordinator.add_task("Write report", 30).await.unwrap();
    app.coordinator.start_task_session(task);
    assert_eq!(app.coordinator.timer().time_formatted(), "30:00");

    app.run_for(600);
    app.coordinator.pause_session();
    app.clock.advance_secs(120);
    app.coordinator.resume_session();
    app.run_for(300);
    app.coordinator.stop_session();

    let saved = app.this_week().await;
    let durations: Vec<u64> = saved.iter().map(|s| s.duration_seconds).collect();
    assert_eq!(durations, vec![600, 300]);
    assert!(saved
        .iter()
        .all(|s| s.task_title.as_deref() == Some("Write report")));
}

#[tokio::test]
async fn tasks_survive_a_round_trip_through_sqlite() {
    let app = app();
    let plan = app.coordinator.add_task("Plan", 15).await.unwrap();
    app.clock.advance_secs(5);
    app.coordinator.add_task("Ship", 45).await.unwrap();

    let titles: Vec<String> = app
        .coordinator
        .tasks()
        .await
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["Ship", "Plan"]);

    assert!(app.coordinator.toggle_task(&plan.id).await.unwrap());
    assert_eq!(app.coordinator.delete_completed_tasks().await.unwrap(), 1);
    app.coordinator.delete_task(&plan.id).await.unwrap();
    assert_eq!(app.coordinator.tasks().await.len(), 1);
    assert!(app.coordinator.toggle_task(&plan.id).await.is_err());
}

#[tokio::test]
async fn reset_clears_history() {
    let mut app = app();
    app.coordinator.start_focus_session(None);
    app.run_for(90);
    app.coordinator.stop_session();
    assert_eq!(app.this_week().await.len(), 1);

    app.coordinator.clear_all_data().await.unwrap();
    assert!(app.this_week().await.is_empty());
}
