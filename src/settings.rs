use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
    time::Duration,
};

/// Tunables consumed by the timer, coordinator and stats engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FocusConfig {
    pub default_duration_secs: u64,
    /// Sessions shorter than this are never persisted.
    pub minimum_session_secs: u64,
    pub tick_interval_ms: u64,
    pub preset_minutes: Vec<u32>,
    pub mock_data_weeks: u32,
    pub focus_mode_enabled: bool,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: 25 * 60,
            minimum_session_secs: 60,
            tick_interval_ms: 1_000,
            preset_minutes: vec![15, 25, 45, 60],
            mock_data_weeks: 3,
            focus_mode_enabled: false,
        }
    }
}

impl FocusConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn default_duration_minutes(&self) -> u64 {
        self.default_duration_secs / 60
    }

    /// Applies environment overrides. `ORBIT_DEBUG=1` speeds the heartbeat
    /// up so a whole session can be watched in a few minutes.
    pub fn with_env_overrides(mut self) -> Self {
        let debug_mode = std::env::var("ORBIT_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            self.tick_interval_ms = 100;
        }
        self
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<FocusConfig>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            FocusConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> FocusConfig {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update<F>(&self, change: F) -> Result<FocusConfig>
    where
        F: FnOnce(&mut FocusConfig),
    {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        change(&mut guard);
        self.persist(&guard)?;
        Ok(guard.clone())
    }

    fn persist(&self, data: &FocusConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
