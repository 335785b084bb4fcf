//! TOML-based application configuration.
//!
//! Stores the reminder tunables:
//! - Threshold base unit and alarm timeout
//! - Crossfade delta, damping and step pacing
//! - Window reopen and follow-up intervals
//! - Speech prompts on/off
//!
//! Configuration is stored at `~/.config/eyerest/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::clock::{ThresholdBinding, ThresholdTable, STANDARD_BINDINGS};
use crate::error::{ConfigError, ThresholdError};

/// Reminder clock configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Base unit in seconds; thresholds fire at multiples of it.
    #[serde(default = "default_test_time")]
    pub test_time: u64,
    #[serde(default = "default_alarm_timeout_secs")]
    pub alarm_timeout_secs: u64,
    /// Ascending `multiplier -> action` schedule.
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<ThresholdBinding>,
}

/// Volume crossfade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RampConfig {
    /// Channel-A change applied by the duck ramp (0.0-1.0 scale).
    #[serde(default = "default_delta")]
    pub delta: f64,
    #[serde(default = "default_damping_factor")]
    pub damping_factor: f64,
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
}

/// Reminder window scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_reopen_interval_secs")]
    pub reopen_interval_secs: u64,
    #[serde(default = "default_follow_up_secs")]
    pub follow_up_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncerConfig {
    #[serde(default = "default_true")]
    pub speech_enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/eyerest/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub ramp: RampConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub announcer: AnnouncerConfig,
}

// Default functions
fn default_test_time() -> u64 {
    10
}
fn default_alarm_timeout_secs() -> u64 {
    40
}
fn default_thresholds() -> Vec<ThresholdBinding> {
    STANDARD_BINDINGS.to_vec()
}
fn default_delta() -> f64 {
    0.5
}
fn default_damping_factor() -> f64 {
    0.3
}
fn default_step_delay_ms() -> u64 {
    100
}
fn default_reopen_interval_secs() -> u64 {
    1800
}
fn default_follow_up_secs() -> u64 {
    180
}
fn default_true() -> bool {
    true
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            test_time: default_test_time(),
            alarm_timeout_secs: default_alarm_timeout_secs(),
            thresholds: default_thresholds(),
        }
    }
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            delta: default_delta(),
            damping_factor: default_damping_factor(),
            step_delay_ms: default_step_delay_ms(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            reopen_interval_secs: default_reopen_interval_secs(),
            follow_up_secs: default_follow_up_secs(),
        }
    }
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            speech_enabled: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clock: ClockConfig::default(),
            ramp: RampConfig::default(),
            window: WindowConfig::default(),
            announcer: AnnouncerConfig::default(),
        }
    }
}

impl ClockConfig {
    /// Fresh table (no entry fired) built from the configured schedule.
    pub fn threshold_table(&self) -> Result<ThresholdTable, ThresholdError> {
        ThresholdTable::from_bindings(&self.thresholds)
    }
}

impl WindowConfig {
    pub fn reopen_interval(&self) -> Duration {
        Duration::from_secs(self.reopen_interval_secs)
    }

    pub fn follow_up(&self) -> Duration {
        Duration::from_secs(self.follow_up_secs)
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Path of the default config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Reject values the clock and ramp cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.into(),
                message: message.into(),
            })
        };
        if self.clock.test_time == 0 {
            return invalid("clock.test_time", "must be at least 1 second");
        }
        if !(-1.0..=1.0).contains(&self.ramp.delta) {
            return invalid("ramp.delta", "must be within -1.0..=1.0");
        }
        if !(0.0..=1.0).contains(&self.ramp.damping_factor) {
            return invalid("ramp.damping_factor", "must be within 0.0..=1.0");
        }
        if let Err(err) = self.clock.threshold_table() {
            return invalid("clock.thresholds", &err.to_string());
        }
        if self.window.reopen_interval_secs == 0 {
            return invalid("window.reopen_interval_secs", "must be at least 1 second");
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, in memory only. Returns error if the key
    /// is unknown or the result does not validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
