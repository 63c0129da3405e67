use thiserror::Error;

use crate::timer::TimerPhase;

/// Failure reported by a storage backend.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage rejected the operation: {0:#}")]
    Store(#[from] anyhow::Error),

    #[error("no record with id {id}")]
    NotFound { id: String },
}

/// A guarded timer transition was attempted from a phase that does not
/// allow it. The timer state is untouched when this is returned.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {action} while the timer is {phase:?}")]
    InvalidTransition {
        action: &'static str,
        phase: TimerPhase,
    },
}

/// Rejected input when creating a task.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TaskInputError {
    #[error("task title must not be empty")]
    EmptyTitle,

    #[error("task duration must be at least one minute")]
    ZeroDuration,
}
