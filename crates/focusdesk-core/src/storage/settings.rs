//! TOML-based application settings.
//!
//! These are process-level knobs (logging, engine timing) rather than the
//! user's timer configuration, which lives in the key-value store.
//!
//! Settings are stored at `~/.config/focusdesk/settings.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::SettingsError;
use crate::timer::EngineOptions;

/// Timer engine tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    /// Delay between a completed countdown and the automatic mode switch.
    #[serde(default = "default_auto_switch_delay_secs")]
    pub auto_switch_delay_secs: u64,
    /// Drop a pending automatic switch when the user resets, switches or
    /// starts the timer during the delay.
    #[serde(default)]
    pub cancel_pending_auto_switch: bool,
    /// How often the driver feeds wall-clock time into the engine.
    #[serde(default = "default_driver_resolution_ms")]
    pub driver_resolution_ms: u64,
}

/// Application settings.
///
/// Serialized to/from TOML at `~/.config/focusdesk/settings.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub timer: TimerSettings,
}

fn default_auto_switch_delay_secs() -> u64 {
    2
}
fn default_driver_resolution_ms() -> u64 {
    200
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            auto_switch_delay_secs: default_auto_switch_delay_secs(),
            cancel_pending_auto_switch: false,
            driver_resolution_ms: default_driver_resolution_ms(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            timer: TimerSettings::default(),
        }
    }
}

impl AppSettings {
    fn path() -> Result<PathBuf, SettingsError> {
        Ok(data_dir()?.join("settings.toml"))
    }

    /// Load from the data directory, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed,
    /// or if the default settings cannot be written to disk.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed,
    /// or if the default settings cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| SettingsError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let settings = Self::default();
                settings.save_to(path)?;
                Ok(settings)
            }
        }
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let save_failed = |message: String| SettingsError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            auto_switch_delay: Duration::from_secs(self.timer.auto_switch_delay_secs),
            cancel_pending_auto_switch: self.timer.cancel_pending_auto_switch,
            ..EngineOptions::default()
        }
    }

    pub fn driver_resolution(&self) -> Duration {
        Duration::from_millis(self.timer.driver_resolution_ms.max(10))
    }
}
