//! Time-of-day energy estimate shown next to the timer.

use chrono::{Local, Timelike};
use serde::Serialize;

use crate::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnergyLevel {
    High,
    Medium,
    Low,
}

impl EnergyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EnergyLevel::High => "High",
            EnergyLevel::Medium => "Medium",
            EnergyLevel::Low => "Low",
        }
    }
}

/// Part of the day, by local hour. Ranges are half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EnergyPhase {
    /// 06:00 to 12:00
    MorningPeak,
    /// 12:00 to 13:00
    MiddayTransition,
    /// 13:00 to 16:00
    AfternoonDecay,
    /// 16:00 to 20:00
    EveningRecovery,
    /// Everything else
    NightMode,
}

impl EnergyPhase {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => EnergyPhase::MorningPeak,
            12 => EnergyPhase::MiddayTransition,
            13..=15 => EnergyPhase::AfternoonDecay,
            16..=19 => EnergyPhase::EveningRecovery,
            _ => EnergyPhase::NightMode,
        }
    }

    /// Phase for the clock's current local hour.
    pub fn current(clock: &dyn Clock) -> Self {
        Self::from_hour(clock.now().with_timezone(&Local).hour())
    }

    pub fn status(self) -> &'static str {
        match self {
            EnergyPhase::MorningPeak => "Morning Peak",
            EnergyPhase::MiddayTransition => "Midday Transition",
            EnergyPhase::AfternoonDecay => "Afternoon Decay (Low Energy)",
            EnergyPhase::EveningRecovery => "Evening Recovery",
            EnergyPhase::NightMode => "Night Mode",
        }
    }

    pub fn level(self) -> EnergyLevel {
        match self {
            EnergyPhase::MorningPeak => EnergyLevel::High,
            EnergyPhase::MiddayTransition | EnergyPhase::EveningRecovery => EnergyLevel::Medium,
            EnergyPhase::AfternoonDecay | EnergyPhase::NightMode => EnergyLevel::Low,
        }
    }
}
