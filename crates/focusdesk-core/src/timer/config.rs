//! Timer configuration and its persisted store.
//!
//! The configuration is a single JSON object under [`CONFIG_KEY`]:
//!
//! ```text
//! {"focusSeconds":1500,"breakSeconds":300,"autoSwitch":true,"soundEnabled":true}
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::TimerMode;
use crate::error::{ConfigKeyError, PersistenceError};
use crate::storage::{save_value, try_load, KvStore};

pub const CONFIG_KEY: &str = "timerConfig";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerConfig {
    #[serde(default = "default_focus_seconds")]
    pub focus_seconds: u64,
    #[serde(default = "default_break_seconds")]
    pub break_seconds: u64,
    #[serde(default = "default_true")]
    pub auto_switch: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
}

fn default_focus_seconds() -> u64 {
    1500
}
fn default_break_seconds() -> u64 {
    300
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_seconds: default_focus_seconds(),
            break_seconds: default_break_seconds(),
            auto_switch: true,
            sound_enabled: true,
        }
    }
}

impl TimerConfig {
    /// Countdown length for `mode`.
    pub fn seconds_for(&self, mode: TimerMode) -> u64 {
        match mode {
            TimerMode::Focus => self.focus_seconds,
            TimerMode::Break => self.break_seconds,
        }
    }

    /// Replace non-positive durations with their defaults.
    fn sanitized(mut self) -> Self {
        if self.focus_seconds == 0 {
            warn!("stored focusSeconds is zero, using default");
            self.focus_seconds = default_focus_seconds();
        }
        if self.break_seconds == 0 {
            warn!("stored breakSeconds is zero, using default");
            self.break_seconds = default_break_seconds();
        }
        self
    }

    /// Get a config value as string by its camelCase key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, parsing `value` as the field's type.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse.
    /// Durations must be positive.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigKeyError> {
        let invalid = |message: String| ConfigKeyError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut json = serde_json::to_value(*self).map_err(|e| invalid(e.to_string()))?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| ConfigKeyError::UnknownKey(key.to_string()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ConfigKeyError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            serde_json::Value::Number(_) => {
                let n = value
                    .parse::<u64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as seconds")))?;
                if n == 0 {
                    return Err(invalid("duration must be positive".into()));
                }
                serde_json::Value::Number(n.into())
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(key.to_string(), new_value);
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }
}

/// Partial update for [`TimerConfig`]. `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(default)]
    pub focus_seconds: Option<u64>,
    #[serde(default)]
    pub break_seconds: Option<u64>,
    #[serde(default)]
    pub auto_switch: Option<bool>,
    #[serde(default)]
    pub sound_enabled: Option<bool>,
}

impl ConfigPatch {
    pub fn focus_seconds(mut self, seconds: u64) -> Self {
        self.focus_seconds = Some(seconds);
        self
    }

    pub fn break_seconds(mut self, seconds: u64) -> Self {
        self.break_seconds = Some(seconds);
        self
    }

    pub fn auto_switch(mut self, enabled: bool) -> Self {
        self.auto_switch = Some(enabled);
        self
    }

    pub fn sound_enabled(mut self, enabled: bool) -> Self {
        self.sound_enabled = Some(enabled);
        self
    }

    /// Merge into `config`. Zero durations are ignored.
    pub fn apply_to(&self, config: &mut TimerConfig) {
        match self.focus_seconds {
            Some(0) => warn!("ignoring zero focusSeconds in config update"),
            Some(s) => config.focus_seconds = s,
            None => {}
        }
        match self.break_seconds {
            Some(0) => warn!("ignoring zero breakSeconds in config update"),
            Some(s) => config.break_seconds = s,
            None => {}
        }
        if let Some(v) = self.auto_switch {
            config.auto_switch = v;
        }
        if let Some(v) = self.sound_enabled {
            config.sound_enabled = v;
        }
    }
}

/// Holds the live [`TimerConfig`] and mirrors it to the key-value store.
pub struct ConfigStore {
    store: Arc<dyn KvStore>,
    current: TimerConfig,
}

impl ConfigStore {
    /// Open the store and load the persisted configuration.
    pub fn open(store: Arc<dyn KvStore>) -> Self {
        let mut config = Self {
            store,
            current: TimerConfig::default(),
        };
        config.current = config.load();
        config
    }

    /// Read the persisted configuration. Never fails: a missing or
    /// malformed value yields the default.
    pub fn load(&self) -> TimerConfig {
        match try_load::<TimerConfig>(self.store.as_ref(), CONFIG_KEY) {
            Ok(Some(config)) => config.sanitized(),
            Ok(None) => {
                debug!("no stored timer config, using defaults");
                TimerConfig::default()
            }
            Err(e) => {
                warn!(error = %e, "failed to load timer config, using defaults");
                TimerConfig::default()
            }
        }
    }

    /// Replace the configuration and persist it. A failed write is logged
    /// and the new value is kept in memory.
    pub fn save(&mut self, config: TimerConfig) {
        if let Err(e) = self.try_save(config) {
            warn!(error = %e, "failed to persist timer config");
        }
    }

    /// Like [`save`](Self::save), but reports a failed write to the caller.
    /// The new value is kept in memory either way.
    ///
    /// # Errors
    /// Returns the store's error if the value could not be written.
    pub fn try_save(&mut self, config: TimerConfig) -> Result<(), PersistenceError> {
        self.current = config;
        save_value(self.store.as_ref(), CONFIG_KEY, &self.current)
    }

    /// Merge `patch` into the current configuration and persist the result.
    pub fn apply(&mut self, patch: &ConfigPatch) -> TimerConfig {
        let mut next = self.current;
        patch.apply_to(&mut next);
        self.save(next);
        next
    }

    pub fn current(&self) -> &TimerConfig {
        &self.current
    }
}
