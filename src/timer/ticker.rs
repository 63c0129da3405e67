use std::time::Duration;

use async_trait::async_trait;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

/// One-second heartbeat that drives a running countdown.
///
/// `heartbeat` resolves once per beat while armed and never resolves while
/// disarmed, so it can sit in a `select!` next to other inputs.
#[async_trait]
pub trait TickSource: Send {
    fn arm(&mut self);
    fn disarm(&mut self);
    fn is_armed(&self) -> bool;
    async fn heartbeat(&mut self);
}

/// Heartbeat backed by a spawned `tokio::time::interval` task.
pub struct IntervalTicker {
    period: Duration,
    handle: Option<JoinHandle<()>>,
    beats: Option<mpsc::Receiver<()>>,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            handle: None,
            beats: None,
        }
    }
}

#[async_trait]
impl TickSource for IntervalTicker {
    fn arm(&mut self) {
        self.disarm();

        let period = self.period;
        let (beat_tx, beat_rx) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if beat_tx.send(()).await.is_err() {
                    break;
                }
            }
        });

        self.handle = Some(handle);
        self.beats = Some(beat_rx);
    }

    fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        // Dropping the receiver discards any beat already queued.
        self.beats = None;
    }

    fn is_armed(&self) -> bool {
        self.beats.is_some()
    }

    async fn heartbeat(&mut self) {
        if let Some(beats) = self.beats.as_mut() {
            if beats.recv().await.is_some() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// Heartbeat that never fires on its own; callers tick the timer by hand.
/// Keeps counts of arm/disarm calls for assertions.
#[derive(Debug, Default)]
pub struct ManualTicker {
    armed: bool,
    pub arm_count: usize,
    pub disarm_count: usize,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TickSource for ManualTicker {
    fn arm(&mut self) {
        self.armed = true;
        self.arm_count += 1;
    }

    fn disarm(&mut self) {
        self.armed = false;
        self.disarm_count += 1;
    }

    fn is_armed(&self) -> bool {
        self.armed
    }

    async fn heartbeat(&mut self) {
        std::future::pending::<()>().await
    }
}
