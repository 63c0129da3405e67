pub mod controller;
pub mod state;
pub mod ticker;

pub use controller::{SessionTimer, TickOutcome, TimerEvent};
pub use state::{TimerPhase, TimerState};
pub use ticker::{IntervalTicker, ManualTicker, TickSource};
