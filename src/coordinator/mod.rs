//! Ties the timer to the repositories and the do-not-disturb signal.
//!
//! The coordinator is the only place that turns elapsed focus time into a
//! stored [`FocusSession`]. It reads the timer's recorded start time just
//! before each closing transition and saves when the wall-clock span
//! clears the configured minimum.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    runtime::Handle,
    sync::{broadcast, mpsc},
    task::JoinSet,
};

use crate::{
    analytics::StatsEngine,
    clock::Clock,
    db::{FocusSession, TaskInput, TaskItem},
    energy::EnergyPhase,
    error::PersistenceError,
    log_debug, log_error, log_info, log_warn,
    repository::{build_mock_sessions, generate_mock_data, SessionRepository, TaskRepository},
    settings::FocusConfig,
    timer::{SessionTimer, TickOutcome, TickSource, TimerPhase},
};

mod focus_mode;

pub use focus_mode::{FocusModeService, FocusModeSignal};

const ENABLE_LOGS: bool = true;
const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LifecycleEvent {
    FocusActivated,
    FocusDeactivated,
    SessionSaved { session: FocusSession },
}

/// Inputs accepted by [`FocusCoordinator::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Toggle,
    Pause,
    Resume,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The countdown reached zero.
    Finished,
    /// Stopped by command or because the command channel closed.
    Stopped,
}

/// Storage collaborators handed to the coordinator.
#[derive(Clone)]
pub struct Repositories {
    pub sessions: Arc<dyn SessionRepository>,
    pub tasks: Arc<dyn TaskRepository>,
}

pub struct FocusCoordinator {
    timer: SessionTimer,
    repositories: Repositories,
    focus_mode: Arc<dyn FocusModeSignal>,
    clock: Arc<dyn Clock>,
    config: FocusConfig,
    current_task: Option<TaskItem>,
    pending_saves: JoinSet<()>,
    events: broadcast::Sender<LifecycleEvent>,
}

impl FocusCoordinator {
    pub fn new(
        config: FocusConfig,
        clock: Arc<dyn Clock>,
        ticker: Box<dyn TickSource>,
        repositories: Repositories,
        focus_mode: Arc<dyn FocusModeSignal>,
    ) -> Self {
        let timer = SessionTimer::new(
            config.default_duration_secs,
            config.minimum_session_secs,
            clock.clone(),
            ticker,
        );
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            timer,
            repositories,
            focus_mode,
            clock,
            config,
            current_task: None,
            pending_saves: JoinSet::new(),
            events,
        }
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn config(&self) -> &FocusConfig {
        &self.config
    }

    pub fn current_task(&self) -> Option<&TaskItem> {
        self.current_task.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    pub fn stats(&self) -> StatsEngine {
        StatsEngine::new(self.repositories.sessions.clone())
    }

    /// Energy estimate for the current local hour.
    pub fn energy(&self) -> EnergyPhase {
        EnergyPhase::current(self.clock.as_ref())
    }

    pub fn start_focus_session(&mut self, duration_secs: Option<u64>) {
        let duration_secs = duration_secs.unwrap_or(self.config.default_duration_secs);
        self.timer.start(duration_secs);
        log_info!("Focus session started for {duration_secs}s");
        self.activate_focus();
    }

    /// Starts a countdown sized by the task. The task is kept as a copy, so
    /// deleting it mid-run does not affect the run.
    pub fn start_task_session(&mut self, task: TaskItem) {
        let duration_secs = task.duration_secs();
        log_info!("Task session '{}' started for {duration_secs}s", task.title);
        self.current_task = Some(task);
        self.timer.start(duration_secs);
        self.activate_focus();
    }

    pub fn pause_session(&mut self) {
        let started_at = self.timer.session_started_at();
        if let Err(err) = self.timer.pause() {
            log_debug!("Pause ignored: {err}");
        }
        self.save_if_long_enough(started_at);
    }

    pub fn resume_session(&mut self) {
        if let Err(err) = self.timer.resume() {
            log_debug!("Resume ignored: {err}");
        }
    }

    pub fn stop_session(&mut self) {
        if self.timer.phase().is_active() {
            self.save_if_long_enough(self.timer.session_started_at());
        }
        self.timer.stop();
        self.current_task = None;
        self.deactivate_focus();
    }

    /// Single primary action: pause when running, resume when paused,
    /// otherwise start a default session.
    pub fn toggle_timer(&mut self) {
        match self.timer.phase() {
            TimerPhase::Running => self.pause_session(),
            TimerPhase::Paused => self.resume_session(),
            TimerPhase::Idle => self.start_focus_session(None),
        }
    }

    /// Feeds one heartbeat to the timer. A natural finish is saved like a
    /// pause and turns do-not-disturb back off.
    pub fn on_heartbeat(&mut self) {
        let started_at = self.timer.session_started_at();
        match self.timer.tick() {
            Ok(TickOutcome::Counting { .. }) => {}
            Ok(TickOutcome::Finished) => {
                log_info!("Focus session finished");
                self.save_if_long_enough(started_at);
                self.deactivate_focus();
            }
            Err(err) => log_debug!("Heartbeat ignored: {err}"),
        }
    }

    pub fn apply(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::Toggle => self.toggle_timer(),
            ControlCommand::Pause => self.pause_session(),
            ControlCommand::Resume => self.resume_session(),
            ControlCommand::Stop => self.stop_session(),
        }
    }

    /// Drives the active countdown until it finishes or is stopped. A
    /// closed command channel counts as a stop.
    pub async fn run(&mut self, commands: &mut mpsc::Receiver<ControlCommand>) -> RunOutcome {
        while self.timer.phase().is_active() {
            tokio::select! {
                _ = self.timer.heartbeat() => self.on_heartbeat(),
                command = commands.recv() => match command {
                    Some(ControlCommand::Stop) | None => {
                        self.stop_session();
                        return RunOutcome::Stopped;
                    }
                    Some(command) => self.apply(command),
                },
            }
        }
        RunOutcome::Finished
    }

    /// Waits for every save spawned so far.
    pub async fn flush_saves(&mut self) {
        while let Some(result) = self.pending_saves.join_next().await {
            if let Err(err) = result {
                log_error!("Session save task failed: {err}");
            }
        }
    }

    pub async fn add_task(&self, title: &str, duration_minutes: u32) -> Result<TaskItem> {
        let task = TaskInput::new(title, duration_minutes)?.into_task(self.clock.now());
        self.repositories.tasks.save(&task).await?;
        Ok(task)
    }

    pub async fn tasks(&self) -> Vec<TaskItem> {
        self.repositories.tasks.fetch_all().await
    }

    pub async fn find_task(&self, task_id: &str) -> Option<TaskItem> {
        self.tasks().await.into_iter().find(|task| task.id == task_id)
    }

    pub async fn toggle_task(&self, task_id: &str) -> Result<bool, PersistenceError> {
        self.repositories.tasks.toggle_completion(task_id).await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<(), PersistenceError> {
        self.repositories.tasks.delete(task_id).await
    }

    pub async fn delete_completed_tasks(&self) -> Result<usize, PersistenceError> {
        self.repositories.tasks.delete_completed().await
    }

    /// Removes every stored focus session.
    pub async fn clear_all_data(&self) -> Result<(), PersistenceError> {
        self.repositories.sessions.delete_all().await
    }

    /// Seeds the configured number of weeks of random sessions.
    pub async fn generate_mock_data(&self) -> usize {
        let sessions = {
            let mut rng = rand::thread_rng();
            build_mock_sessions(self.clock.now(), self.config.mock_data_weeks, &mut rng)
        };
        generate_mock_data(self.repositories.sessions.as_ref(), sessions).await
    }

    /// Saves the running window that began at `started_at` if it lasted
    /// at least the minimum. The write is spawned on the current Tokio
    /// runtime and never awaited here; failures, including having no
    /// runtime to spawn on, are logged and dropped.
    fn save_if_long_enough(&mut self, started_at: Option<DateTime<Utc>>) {
        let Some(started_at) = started_at else {
            return;
        };

        let elapsed = (self.clock.now() - started_at)
            .to_std()
            .unwrap_or_default();
        if elapsed < self.timer.minimum_session() {
            log_debug!("Not saving {}s of focus, below minimum", elapsed.as_secs());
            return;
        }

        let session = FocusSession::new(
            started_at,
            elapsed.as_secs(),
            self.current_task.as_ref().map(|task| task.title.clone()),
        );

        let Ok(runtime) = Handle::try_current() else {
            log_warn!("No async runtime, discarding focus session {}", session.id);
            return;
        };

        while self.pending_saves.try_join_next().is_some() {}

        let sessions = Arc::clone(&self.repositories.sessions);
        let events = self.events.clone();
        self.pending_saves.spawn_on(async move {
            match sessions.save(&session).await {
                Ok(()) => {
                    log_info!(
                        "Saved {}s focus session {}",
                        session.duration_seconds,
                        session.id
                    );
                    let _ = events.send(LifecycleEvent::SessionSaved { session });
                }
                Err(err) => {
                    log_warn!("Discarding focus session {}: {err}", session.id);
                }
            }
        }, &runtime);
    }

    fn activate_focus(&self) {
        self.focus_mode.activate_focus();
        let _ = self.events.send(LifecycleEvent::FocusActivated);
    }

    fn deactivate_focus(&self) {
        self.focus_mode.deactivate_focus();
        let _ = self.events.send(LifecycleEvent::FocusDeactivated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        error::TaskInputError,
        repository::{MemorySessionStore, MemoryTaskStore},
        timer::{IntervalTicker, ManualTicker},
    };
    use chrono::TimeZone;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    #[derive(Default)]
    struct CountingFocusMode {
        activations: AtomicUsize,
        deactivations: AtomicUsize,
    }

    impl FocusModeSignal for CountingFocusMode {
        fn activate_focus(&self) {
            self.activations.fetch_add(1, Ordering::SeqCst);
        }

        fn deactivate_focus(&self) {
            self.deactivations.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        coordinator: FocusCoordinator,
        clock: Arc<ManualClock>,
        sessions: Arc<MemorySessionStore>,
        focus: Arc<CountingFocusMode>,
    }

    fn harness_with_ticker(ticker: Box<dyn TickSource>) -> Harness {
        let start = Utc.with_ymd_and_hms(2024, 1, 17, 9, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let sessions = Arc::new(MemorySessionStore::new(clock.clone()));
        let focus = Arc::new(CountingFocusMode::default());
        let coordinator = FocusCoordinator::new(
            FocusConfig::default(),
            clock.clone(),
            ticker,
            Repositories {
                sessions: sessions.clone(),
                tasks: Arc::new(MemoryTaskStore::new()),
            },
            focus.clone(),
        );
        Harness {
            coordinator,
            clock,
            sessions,
            focus,
        }
    }

    fn harness() -> Harness {
        harness_with_ticker(Box::new(ManualTicker::new()))
    }

    impl Harness {
        fn beat(&mut self, count: u64) {
            for _ in 0..count {
                self.clock.advance_secs(1);
                self.coordinator.on_heartbeat();
            }
        }

        async fn saved(&mut self) -> Vec<FocusSession> {
            self.coordinator.flush_saves().await;
            self.sessions.all()
        }
    }

    #[tokio::test]
    async fn pause_below_minimum_saves_nothing() {
        let mut h = harness();
        h.coordinator.start_focus_session(Some(1500));
        h.beat(59);
        h.coordinator.pause_session();

        assert_eq!(h.coordinator.timer().phase(), TimerPhase::Paused);
        assert!(h.saved().await.is_empty());
    }

    #[tokio::test]
    async fn pause_at_minimum_saves_one_session() {
        let mut h = harness();
        h.coordinator.start_focus_session(Some(1500));
        let started = h.clock.now();
        h.beat(60);
        h.coordinator.pause_session();

        let saved = h.saved().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].duration_seconds, 60);
        assert_eq!(saved[0].start_time, started);
        assert_eq!(saved[0].task_title, None);
    }

    #[tokio::test]
    async fn repeated_pause_does_not_double_save() {
        let mut h = harness();
        h.coordinator.start_focus_session(None);
        h.beat(120);
        h.coordinator.pause_session();
        h.clock.advance_secs(600);
        h.coordinator.pause_session();

        assert_eq!(h.saved().await.len(), 1);
    }

    #[tokio::test]
    async fn each_running_window_is_saved_separately() {
        let mut h = harness();
        h.coordinator.start_focus_session(None);
        h.beat(90);
        h.coordinator.pause_session();
        h.clock.advance_secs(300);
        h.coordinator.resume_session();
        h.beat(70);
        h.coordinator.stop_session();

        let durations: Vec<u64> = h.saved().await.iter().map(|s| s.duration_seconds).collect();
        assert_eq!(durations, vec![90, 70]);
    }

    #[tokio::test]
    async fn stop_while_running_saves_and_deactivates() {
        let mut h = harness();
        h.coordinator.start_focus_session(None);
        h.beat(200);
        h.coordinator.stop_session();

        assert_eq!(h.coordinator.timer().phase(), TimerPhase::Idle);
        assert_eq!(h.coordinator.timer().time_left_secs(), 1500);
        assert_eq!(h.saved().await[0].duration_seconds, 200);
        assert_eq!(h.focus.activations.load(Ordering::SeqCst), 1);
        assert_eq!(h.focus.deactivations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_after_pause_does_not_save_paused_time() {
        let mut h = harness();
        h.coordinator.start_focus_session(None);
        h.beat(30);
        h.coordinator.pause_session();
        h.clock.advance_secs(3600);
        h.coordinator.stop_session();

        assert!(h.saved().await.is_empty());
    }

    #[tokio::test]
    async fn stop_when_idle_only_deactivates() {
        let mut h = harness();
        h.coordinator.stop_session();
        assert!(h.saved().await.is_empty());
        assert_eq!(h.focus.deactivations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn task_session_uses_task_duration_and_title_snapshot() {
        let mut h = harness();
        let task = h.coordinator.add_task("  Draft essay ", 45).await.unwrap();
        h.coordinator.start_task_session(task.clone());
        assert_eq!(h.coordinator.timer().time_left_secs(), 45 * 60);

        h.coordinator.delete_task(&task.id).await.unwrap();
        h.beat(300);
        assert_eq!(h.coordinator.timer().phase(), TimerPhase::Running);
        h.coordinator.stop_session();

        let saved = h.saved().await;
        assert_eq!(saved[0].task_title.as_deref(), Some("Draft essay"));
        assert!(h.coordinator.current_task().is_none());
    }

    #[tokio::test]
    async fn restarting_mid_run_gives_no_credit() {
        let mut h = harness();
        h.coordinator.start_focus_session(None);
        h.beat(600);
        h.coordinator.start_focus_session(Some(900));

        assert!(h.saved().await.is_empty());
        assert_eq!(h.focus.activations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn natural_completion_saves_resets_and_deactivates() {
        let mut h = harness();
        let mut events = h.coordinator.subscribe();
        h.coordinator.start_focus_session(Some(60));
        h.beat(60);
        assert_eq!(h.coordinator.timer().phase(), TimerPhase::Running);
        assert_eq!(h.focus.deactivations.load(Ordering::SeqCst), 0);

        h.beat(1);
        assert_eq!(h.coordinator.timer().phase(), TimerPhase::Idle);
        assert_eq!(h.coordinator.timer().time_left_secs(), 1500);
        assert_eq!(h.focus.deactivations.load(Ordering::SeqCst), 1);

        let saved = h.saved().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].duration_seconds, 61);

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(seen.first(), Some(&LifecycleEvent::FocusActivated));
        assert!(seen.contains(&LifecycleEvent::FocusDeactivated));
        assert!(seen.contains(&LifecycleEvent::SessionSaved {
            session: saved[0].clone()
        }));
    }

    #[test]
    fn save_without_runtime_is_discarded() {
        let mut h = harness();
        h.coordinator.start_focus_session(None);
        h.beat(60);
        h.coordinator.pause_session();

        assert_eq!(h.coordinator.timer().phase(), TimerPhase::Paused);
        assert!(h.sessions.all().is_empty());

        h.coordinator.resume_session();
        h.beat(90);
        h.coordinator.stop_session();
        assert_eq!(h.coordinator.timer().phase(), TimerPhase::Idle);
        assert!(h.sessions.all().is_empty());
    }

    #[tokio::test]
    async fn idle_heartbeats_leave_focus_mode_alone() {
        let mut h = harness();
        let mut events = h.coordinator.subscribe();
        h.beat(3);
        assert_eq!(h.focus.deactivations.load(Ordering::SeqCst), 0);
        assert!(events.try_recv().is_err());

        h.coordinator.start_focus_session(None);
        h.coordinator.stop_session();
        h.beat(3);
        assert_eq!(h.focus.deactivations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn energy_uses_the_coordinator_clock() {
        let h = harness();
        h.clock.set(
            chrono::Local
                .with_ymd_and_hms(2024, 1, 17, 7, 0, 0)
                .earliest()
                .unwrap()
                .with_timezone(&Utc),
        );
        assert_eq!(h.coordinator.energy(), EnergyPhase::MorningPeak);
    }

    #[tokio::test]
    async fn toggle_cycles_through_phases() {
        let mut h = harness();
        h.coordinator.toggle_timer();
        assert_eq!(h.coordinator.timer().phase(), TimerPhase::Running);
        assert_eq!(h.coordinator.timer().initial_duration_secs(), 1500);

        h.coordinator.toggle_timer();
        assert_eq!(h.coordinator.timer().phase(), TimerPhase::Paused);

        h.coordinator.toggle_timer();
        assert_eq!(h.coordinator.timer().phase(), TimerPhase::Running);
        assert_eq!(h.focus.activations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_saves_are_swallowed() {
        let mut h = harness();
        h.sessions.set_reject_writes(true);
        h.coordinator.start_focus_session(None);
        h.beat(120);
        h.coordinator.pause_session();

        assert!(h.saved().await.is_empty());
        assert_eq!(h.coordinator.timer().phase(), TimerPhase::Paused);
    }

    #[tokio::test]
    async fn add_task_rejects_blank_titles() {
        let h = harness();
        let err = h.coordinator.add_task("   ", 25).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<TaskInputError>(),
            Some(&TaskInputError::EmptyTitle)
        );
        assert!(h.coordinator.tasks().await.is_empty());
    }

    #[tokio::test]
    async fn task_operations_delegate_to_repository() {
        let h = harness();
        let first = h.coordinator.add_task("Plan", 15).await.unwrap();
        h.clock.advance_secs(1);
        let second = h.coordinator.add_task("Build", 60).await.unwrap();

        let ids: Vec<_> = h.coordinator.tasks().await.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.id.clone(), first.id.clone()]);

        assert!(h.coordinator.toggle_task(&first.id).await.unwrap());
        assert_eq!(h.coordinator.find_task(&first.id).await.map(|t| t.is_completed), Some(true));
        assert_eq!(h.coordinator.delete_completed_tasks().await.unwrap(), 1);
        assert!(h.coordinator.find_task(&first.id).await.is_none());
    }

    #[tokio::test]
    async fn mock_data_and_reset() {
        let h = harness();
        let generated = h.coordinator.generate_mock_data().await;
        assert_eq!(h.sessions.all().len(), generated);

        h.coordinator.clear_all_data().await.unwrap();
        assert!(h.sessions.all().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_drives_countdown_to_completion() {
        let mut h = harness_with_ticker(Box::new(IntervalTicker::new(Duration::from_secs(1))));
        let (_commands_tx, mut commands) = mpsc::channel(4);
        h.coordinator.start_focus_session(Some(3));

        let outcome = h.coordinator.run(&mut commands).await;
        assert_eq!(outcome, RunOutcome::Finished);
        assert_eq!(h.coordinator.timer().phase(), TimerPhase::Idle);
        assert_eq!(h.focus.deactivations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_when_commands_close() {
        let mut h = harness_with_ticker(Box::new(IntervalTicker::new(Duration::from_secs(1))));
        let (commands_tx, mut commands) = mpsc::channel(4);
        h.coordinator.start_focus_session(None);
        commands_tx.send(ControlCommand::Pause).await.unwrap();
        drop(commands_tx);

        let outcome = h.coordinator.run(&mut commands).await;
        assert_eq!(outcome, RunOutcome::Stopped);
        assert_eq!(h.coordinator.timer().phase(), TimerPhase::Idle);
    }
}
