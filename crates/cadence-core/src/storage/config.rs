//! TOML-based engine configuration.
//!
//! Stores user preferences including:
//! - Pattern defaults used while history is thin
//! - Check-in and notification limits
//! - Nudge optimizer lookback
//!
//! Configuration is stored at `~/.config/cadence/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::checkin::CheckInConfig;
use crate::error::{ConfigError, CoreError, Result};
use crate::nudge::{NotificationStyle, NudgeTimeOptimizer, ThrottleConfig};
use crate::patterns::PatternAnalyzer;
use crate::suggestion::SuggestionScorer;

/// Pattern analysis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Reported while there is not enough history
    pub default_peak_hours: Vec<u8>,
    pub default_best_days: Vec<u8>,
    /// Days of history loaded into each snapshot
    pub history_window_days: i64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_peak_hours: vec![9, 10, 11],
            default_best_days: vec![1, 2, 3],
            history_window_days: 60,
        }
    }
}

impl AnalysisConfig {
    pub fn analyzer(&self) -> PatternAnalyzer {
        PatternAnalyzer::with_defaults(
            self.default_peak_hours.clone(),
            self.default_best_days.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionsConfig {
    pub top_n: usize,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self { top_n: 3 }
    }
}

impl SuggestionsConfig {
    pub fn scorer(&self) -> SuggestionScorer {
        SuggestionScorer::with_top_n(self.top_n)
    }
}

/// Proactive check-in settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckInsConfig {
    pub enabled: bool,
    pub cooldown_minutes: i64,
    pub waking_start_hour: u8,
    pub waking_end_hour: u8,
}

impl Default for CheckInsConfig {
    fn default() -> Self {
        let defaults = CheckInConfig::default();
        Self {
            enabled: true,
            cooldown_minutes: defaults.cooldown_minutes,
            waking_start_hour: defaults.waking_start_hour,
            waking_end_hour: defaults.waking_end_hour,
        }
    }
}

impl CheckInsConfig {
    pub fn scheduler_config(&self) -> CheckInConfig {
        CheckInConfig {
            cooldown_minutes: self.cooldown_minutes,
            waking_start_hour: self.waking_start_hour,
            waking_end_hour: self.waking_end_hour,
            ..CheckInConfig::default()
        }
    }
}

/// Ad-hoc notification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub enabled: bool,
    pub quiet_start_hour: u8,
    pub quiet_end_hour: u8,
    pub max_per_hour: usize,
    pub dismissal_window_minutes: i64,
    pub dismissal_threshold: usize,
    pub style: NotificationStyle,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        let defaults = ThrottleConfig::default();
        Self {
            enabled: true,
            quiet_start_hour: defaults.quiet_start_hour,
            quiet_end_hour: defaults.quiet_end_hour,
            max_per_hour: defaults.max_per_hour,
            dismissal_window_minutes: defaults.dismissal_window_minutes,
            dismissal_threshold: defaults.dismissal_threshold,
            style: defaults.style,
        }
    }
}

impl NotificationsConfig {
    pub fn throttle_config(&self) -> ThrottleConfig {
        ThrottleConfig {
            quiet_start_hour: self.quiet_start_hour,
            quiet_end_hour: self.quiet_end_hour,
            max_per_hour: self.max_per_hour,
            dismissal_window_minutes: self.dismissal_window_minutes,
            dismissal_threshold: self.dismissal_threshold,
            style: self.style,
            ..ThrottleConfig::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NudgesConfig {
    pub lookback_days: i64,
    pub task_suggestion_hour: u8,
}

impl Default for NudgesConfig {
    fn default() -> Self {
        let defaults = NudgeTimeOptimizer::new();
        Self {
            lookback_days: defaults.lookback_days,
            task_suggestion_hour: defaults.task_suggestion_hour,
        }
    }
}

impl NudgesConfig {
    pub fn optimizer(&self) -> NudgeTimeOptimizer {
        NudgeTimeOptimizer {
            lookback_days: self.lookback_days,
            task_suggestion_hour: self.task_suggestion_hour % 24,
            ..NudgeTimeOptimizer::new()
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Owner of persisted nudges, check-ins and notification history
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
    #[serde(default)]
    pub checkins: CheckInsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub nudges: NudgesConfig,
}

fn default_user_id() -> String {
    "local".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            analysis: AnalysisConfig::default(),
            suggestions: SuggestionsConfig::default(),
            checkins: CheckInsConfig::default(),
            notifications: NotificationsConfig::default(),
            nudges: NudgesConfig::default(),
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
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
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

    /// `<data_dir>/config.toml`
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str::<Self>(&content).map_err(|e| {
                CoreError::from(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default config");
            Self::default()
        })
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

    /// Set a value by dot-separated key. The caller persists with `save`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Every leaf key with its current value, sorted.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out.sort();
        out
    }
}
