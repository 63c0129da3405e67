use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::{clock::Clock, error::TransitionError, log_debug};

use super::{TickSource, TimerPhase, TimerState};

const ENABLE_LOGS: bool = true;
const EVENT_CAPACITY: usize = 64;

/// Notifications published by the timer. Nothing in the timer depends on
/// anyone listening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TimerEvent {
    TickOccurred { time_left_secs: u64 },
    /// A running window closed with enough wall-clock time to be worth
    /// saving.
    SessionCompleted { elapsed: Duration },
    /// The countdown reached zero on its own.
    SessionFinished,
    PhaseChanged { from: TimerPhase, to: TimerPhase },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Counting { time_left_secs: u64 },
    Finished,
}

/// Countdown state machine: Idle, Running, Paused.
///
/// Every transition disarms the heartbeat before touching state, so a beat
/// can never land on a half-applied transition.
pub struct SessionTimer {
    state: TimerState,
    default_duration_secs: u64,
    minimum_session: Duration,
    clock: Arc<dyn Clock>,
    ticker: Box<dyn TickSource>,
    events: broadcast::Sender<TimerEvent>,
}

impl SessionTimer {
    pub fn new(
        default_duration_secs: u64,
        minimum_session_secs: u64,
        clock: Arc<dyn Clock>,
        ticker: Box<dyn TickSource>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: TimerState::new(default_duration_secs),
            default_duration_secs,
            minimum_session: Duration::from_secs(minimum_session_secs),
            clock,
            ticker,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> TimerPhase {
        self.state.phase
    }

    pub fn is_running(&self) -> bool {
        self.state.phase == TimerPhase::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state.phase == TimerPhase::Paused
    }

    pub fn time_left_secs(&self) -> u64 {
        self.state.time_left_secs
    }

    pub fn initial_duration_secs(&self) -> u64 {
        self.state.initial_duration_secs
    }

    pub fn progress(&self) -> f64 {
        self.state.progress()
    }

    pub fn time_formatted(&self) -> String {
        self.state.time_formatted()
    }

    pub fn session_started_at(&self) -> Option<DateTime<Utc>> {
        self.state.session_started_at
    }

    pub fn minimum_session(&self) -> Duration {
        self.minimum_session
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_armed()
    }

    /// Resolves on the next heartbeat. Pending forever unless running.
    pub async fn heartbeat(&mut self) {
        self.ticker.heartbeat().await
    }

    /// Starts a fresh countdown from any phase. An interrupted run earns
    /// no credit here; whoever wanted it saved must pause or stop first.
    pub fn start(&mut self, duration_secs: u64) {
        self.ticker.disarm();
        let from = self.state.phase;
        self.state.begin_run(duration_secs, self.clock.now());
        self.ticker.arm();
        self.announce_phase(from);
    }

    pub fn pause(&mut self) -> Result<(), TransitionError> {
        self.guard("pause", TimerPhase::Running)?;

        self.ticker.disarm();
        self.close_running_window();
        self.set_phase(TimerPhase::Paused);
        Ok(())
    }

    /// Continues a paused countdown; remaining and initial durations are
    /// left exactly as they were.
    pub fn resume(&mut self) -> Result<(), TransitionError> {
        self.guard("resume", TimerPhase::Paused)?;

        self.ticker.disarm();
        self.state.session_started_at = Some(self.clock.now());
        self.ticker.arm();
        self.set_phase(TimerPhase::Running);
        Ok(())
    }

    /// Stops from any phase and resets to the default duration. Does no
    /// save accounting of its own.
    pub fn stop(&mut self) {
        self.ticker.disarm();
        let from = self.state.phase;
        self.state.reset(self.default_duration_secs);
        self.announce_phase(from);
    }

    pub fn set_duration(&mut self, duration_secs: u64) -> Result<(), TransitionError> {
        self.guard("set duration", TimerPhase::Idle)?;

        self.state.time_left_secs = duration_secs;
        self.state.initial_duration_secs = duration_secs;
        Ok(())
    }

    /// Applies one heartbeat. The beat that finds nothing left completes
    /// the session instead of counting below zero.
    pub fn tick(&mut self) -> Result<TickOutcome, TransitionError> {
        self.guard("tick", TimerPhase::Running)?;

        if self.state.time_left_secs > 0 {
            self.state.time_left_secs -= 1;
            let time_left_secs = self.state.time_left_secs;
            self.emit(TimerEvent::TickOccurred { time_left_secs });
            return Ok(TickOutcome::Counting { time_left_secs });
        }

        self.finish();
        Ok(TickOutcome::Finished)
    }

    fn finish(&mut self) {
        self.ticker.disarm();
        self.close_running_window();
        self.emit(TimerEvent::SessionFinished);

        let from = self.state.phase;
        self.state.reset(self.default_duration_secs);
        self.announce_phase(from);
    }

    /// Reports the current running window if it cleared the threshold,
    /// then forgets its start time.
    fn close_running_window(&mut self) {
        let elapsed = self.state.elapsed_at(self.clock.now());
        if elapsed >= self.minimum_session {
            self.emit(TimerEvent::SessionCompleted { elapsed });
        }
        self.state.session_started_at = None;
    }

    fn guard(&self, action: &'static str, required: TimerPhase) -> Result<(), TransitionError> {
        if self.state.phase == required {
            return Ok(());
        }
        log_debug!(
            "Ignoring {action}: timer is {}",
            self.state.phase.as_str()
        );
        Err(TransitionError::InvalidTransition {
            action,
            phase: self.state.phase,
        })
    }

    fn set_phase(&mut self, to: TimerPhase) {
        let from = self.state.phase;
        self.state.phase = to;
        self.announce_phase(from);
    }

    fn announce_phase(&self, from: TimerPhase) {
        let to = self.state.phase;
        if from != to {
            self.emit(TimerEvent::PhaseChanged { from, to });
        }
    }

    fn emit(&self, event: TimerEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }
}
