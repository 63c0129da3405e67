//! Focus timer core: a pausable countdown, best-effort session capture,
//! a task list and weekly focus statistics over SQLite.

pub mod analytics;
pub mod clock;
pub mod coordinator;
pub mod db;
pub mod energy;
pub mod error;
pub mod repository;
pub mod settings;
pub mod timer;
pub mod utils;

pub use analytics::{StatsEngine, WeekStats};
pub use clock::{Clock, SystemClock};
pub use coordinator::{
    ControlCommand, FocusCoordinator, FocusModeService, FocusModeSignal, LifecycleEvent,
    Repositories, RunOutcome,
};
pub use db::{Database, FocusSession, TaskItem};
pub use energy::{EnergyLevel, EnergyPhase};
pub use error::{PersistenceError, TaskInputError, TransitionError};
pub use settings::{FocusConfig, SettingsStore};
pub use timer::{IntervalTicker, SessionTimer, TimerPhase};
