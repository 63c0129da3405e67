use std::sync::atomic::{AtomicBool, Ordering};

use crate::log_info;

const ENABLE_LOGS: bool = true;

/// One-way do-not-disturb signals. Implementations must return promptly;
/// the coordinator never waits on the OS side effect.
pub trait FocusModeSignal: Send + Sync {
    fn activate_focus(&self);
    fn deactivate_focus(&self);
}

/// Tracks whether do-not-disturb should currently be on. Only acts while
/// enabled in settings.
#[derive(Debug)]
pub struct FocusModeService {
    enabled: AtomicBool,
    focus_active: AtomicBool,
}

impl FocusModeService {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            focus_active: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_focus_active(&self) -> bool {
        self.focus_active.load(Ordering::SeqCst)
    }

    fn apply(&self, active: bool) {
        if !self.is_enabled() {
            return;
        }
        let was_active = self.focus_active.swap(active, Ordering::SeqCst);
        if was_active != active {
            log_info!(
                "Do not disturb {}",
                if active { "activated" } else { "deactivated" }
            );
        }
    }
}

impl FocusModeSignal for FocusModeService {
    fn activate_focus(&self) {
        self.apply(true);
    }

    fn deactivate_focus(&self) {
        self.apply(false);
    }
}
