//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Snooze limits and duration
//! - Auto-dismiss timeout
//! - Spoken time announcements
//! - Clock display and media shuffle
//! - Defaults for newly created alarms
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::settings::{AlarmDefaults, AlarmSettings};

/// Snooze configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnoozeConfig {
    /// Negative means unlimited.
    #[serde(default = "default_max_snooze")]
    pub max_snooze: i32,
    #[serde(default = "default_snooze_duration")]
    pub duration_min: u32,
}

/// Dismiss configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissConfig {
    /// 0 disables auto-dismiss.
    #[serde(default = "default_auto_dismiss")]
    pub auto_dismiss_min: u32,
}

/// Spoken time configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SpeechConfig {
    #[serde(default)]
    pub speak_to_me: bool,
    /// 0 speaks once.
    #[serde(default)]
    pub frequency_min: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    #[serde(default)]
    pub use_24_hour: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MediaConfig {
    #[serde(default)]
    pub shuffle: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub snooze: SnoozeConfig,
    #[serde(default)]
    pub dismiss: DismissConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub media: MediaConfig,
    /// Seed values for new alarms.
    #[serde(default)]
    pub defaults: AlarmDefaults,
}

// Default functions
fn default_max_snooze() -> i32 {
    -1
}
fn default_snooze_duration() -> u32 {
    5
}
fn default_auto_dismiss() -> u32 {
    15
}

impl Default for SnoozeConfig {
    fn default() -> Self {
        Self {
            max_snooze: default_max_snooze(),
            duration_min: default_snooze_duration(),
        }
    }
}

impl Default for DismissConfig {
    fn default() -> Self {
        Self {
            auto_dismiss_min: default_auto_dismiss(),
        }
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
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Location of the config file.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
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

    /// Change a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit
    /// the field.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.update(key, value)?;
        self.save()
    }

    /// Snapshot handed to alarm operations.
    pub fn settings(&self) -> AlarmSettings {
        AlarmSettings {
            max_snooze: self.snooze.max_snooze,
            snooze_duration_min: self.snooze.duration_min,
            auto_dismiss_min: self.dismiss.auto_dismiss_min,
            speak_to_me: self.speech.speak_to_me,
            speak_frequency_min: self.speech.frequency_min,
            use_24_hour: self.display.use_24_hour,
            shuffle: self.media.shuffle,
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DaySet;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let parsed: Config = toml::from_str("[snooze]\nmax_snooze = 3\n").unwrap();
        assert_eq!(parsed.snooze.max_snooze, 3);
        assert_eq!(parsed.snooze.duration_min, 5);
        assert_eq!(parsed.dismiss.auto_dismiss_min, 15);
        assert_eq!(parsed.defaults.volume, 75);
    }

    #[test]
    fn settings_snapshot_matches_defaults() {
        assert_eq!(Config::default().settings(), AlarmSettings::default());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("snooze.max_snooze").as_deref(), Some("-1"));
        assert_eq!(cfg.get("speech.speak_to_me").as_deref(), Some("false"));
        assert_eq!(cfg.get("defaults.audio_source").as_deref(), Some("Media"));
        assert!(cfg.get("snooze.missing_key").is_none());
    }

    #[test]
    fn update_accepts_negative_numbers() {
        let mut cfg = Config::default();
        cfg.update("snooze.max_snooze", "3").unwrap();
        assert_eq!(cfg.snooze.max_snooze, 3);
        cfg.update("snooze.max_snooze", "-1").unwrap();
        assert_eq!(cfg.settings().max_snooze, -1);
    }

    #[test]
    fn update_rejects_negative_for_unsigned_field() {
        let mut cfg = Config::default();
        let err = cfg.update("dismiss.auto_dismiss_min", "-5").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(cfg.dismiss.auto_dismiss_min, 15);
    }

    #[test]
    fn update_nested_bool_and_string() {
        let mut cfg = Config::default();
        cfg.update("display.use_24_hour", "true").unwrap();
        cfg.update("defaults.name", "Wake up").unwrap();
        cfg.update("defaults.days", "62").unwrap();
        assert!(cfg.settings().use_24_hour);
        assert_eq!(cfg.defaults.name, "Wake up");
        assert_eq!(cfg.defaults.days, DaySet::WEEKDAYS);
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "snooze.nonexistent_key", "1");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_json_value_by_path_rejects_invalid_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "speech.speak_to_me", "sometimes");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn load_from_writes_default_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg;
        changed.update("media.shuffle", "true").unwrap();
        changed.save_to(&path).unwrap();
        assert!(Config::load_from(&path).unwrap().media.shuffle);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "snooze = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseFailed(_))
        ));
    }
}
