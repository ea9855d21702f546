//! Immutable history records.
//!
//! All timestamps are local wall-clock time. Records are append-only; derived
//! values such as hour and weekday are computed from the timestamp on access.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Coarse energy classification used by tasks and completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
}

impl EnergyLevel {
    /// Numeric weight used for averaging (low=1, medium=2, high=3).
    pub fn weight(self) -> f64 {
        match self {
            EnergyLevel::Low => 1.0,
            EnergyLevel::Medium => 2.0,
            EnergyLevel::High => 3.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EnergyLevel::Low => "low",
            EnergyLevel::Medium => "medium",
            EnergyLevel::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(EnergyLevel::Low),
            "medium" | "med" => Some(EnergyLevel::Medium),
            "high" => Some(EnergyLevel::High),
            _ => None,
        }
    }
}

/// Self-reported mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Low,
    Neutral,
    High,
}

impl Mood {
    /// Numeric value used in correlations (low=1, neutral=2, high=3).
    pub fn value(self) -> f64 {
        match self {
            Mood::Low => 1.0,
            Mood::Neutral => 2.0,
            Mood::High => 3.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mood::Low => "low",
            Mood::Neutral => "neutral",
            Mood::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Mood::Low),
            "neutral" | "ok" => Some(Mood::Neutral),
            "high" => Some(Mood::High),
            _ => None,
        }
    }
}

/// A task marked done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub id: String,
    pub task_id: String,
    pub task_title: String,
    pub energy_level: EnergyLevel,
    pub completed_at: NaiveDateTime,
    #[serde(default)]
    pub completion_duration_ms: Option<u64>,
    #[serde(default)]
    pub mood: Option<Mood>,
}

impl CompletionRecord {
    pub fn new(
        task_id: impl Into<String>,
        task_title: impl Into<String>,
        energy_level: EnergyLevel,
        completed_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            task_title: task_title.into(),
            energy_level,
            completed_at,
            completion_duration_ms: None,
            mood: None,
        }
    }

    /// Hour of day (0-23).
    pub fn hour(&self) -> u8 {
        self.completed_at.hour() as u8
    }

    /// Day of week (0-6, Sunday=0).
    pub fn day_of_week(&self) -> u8 {
        self.completed_at.weekday().num_days_from_sunday() as u8
    }
}

/// Self-reported energy on a 1-10 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyEntry {
    pub id: String,
    pub level: u8,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl EnergyEntry {
    pub const MIN_LEVEL: u8 = 1;
    pub const MAX_LEVEL: u8 = 10;
    pub const NEUTRAL_LEVEL: u8 = 5;

    /// Out-of-range levels are clamped to 1-10.
    pub fn new(level: i64, timestamp: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            level: clamp_level(level),
            timestamp,
            notes: None,
            context: None,
        }
    }

    /// Level clamped to the valid scale, for records built by hand.
    pub fn clamped_level(&self) -> u8 {
        clamp_level(i64::from(self.level))
    }

    pub fn band(&self) -> EnergyLevel {
        match self.clamped_level() {
            1..=3 => EnergyLevel::Low,
            4..=7 => EnergyLevel::Medium,
            _ => EnergyLevel::High,
        }
    }
}

fn clamp_level(level: i64) -> u8 {
    level.clamp(
        i64::from(EnergyEntry::MIN_LEVEL),
        i64::from(EnergyEntry::MAX_LEVEL),
    ) as u8
}

/// Self-reported mood, optionally tagged with the energy felt at the time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: String,
    pub mood: Mood,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub energy: Option<EnergyLevel>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl MoodEntry {
    pub fn new(mood: Mood, timestamp: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            mood,
            timestamp,
            energy: None,
            notes: None,
            context: None,
        }
    }

    pub fn with_energy(mut self, energy: EnergyLevel) -> Self {
        self.energy = Some(energy);
        self
    }
}

/// A finished focus session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSessionRecord {
    pub id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    pub started_at: NaiveDateTime,
    #[serde(default)]
    pub ended_at: Option<NaiveDateTime>,
    pub duration_minutes: i64,
}

impl FocusSessionRecord {
    /// # Errors
    /// Returns `ValidationError::NegativeDuration` for a negative duration.
    pub fn new(
        task_id: Option<String>,
        started_at: NaiveDateTime,
        duration_minutes: i64,
    ) -> Result<Self, ValidationError> {
        if duration_minutes < 0 {
            return Err(ValidationError::NegativeDuration {
                field: "duration_minutes".to_string(),
                value: duration_minutes,
            });
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            task_id,
            started_at,
            ended_at: Some(started_at + chrono::Duration::minutes(duration_minutes)),
            duration_minutes,
        })
    }

    pub fn hour(&self) -> u8 {
        self.started_at.hour() as u8
    }

    pub fn day_of_week(&self) -> u8 {
        self.started_at.weekday().num_days_from_sunday() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn completion_derives_hour_and_weekday() {
        // 2024-06-02 is a Sunday
        let record = CompletionRecord::new("t1", "Write", EnergyLevel::High, at(2024, 6, 2, 14));
        assert_eq!(record.hour(), 14);
        assert_eq!(record.day_of_week(), 0);
    }

    #[test]
    fn energy_entry_clamps_out_of_range() {
        assert_eq!(EnergyEntry::new(42, at(2024, 6, 3, 9)).level, 10);
        assert_eq!(EnergyEntry::new(-3, at(2024, 6, 3, 9)).level, 1);
        assert_eq!(EnergyEntry::new(6, at(2024, 6, 3, 9)).band(), EnergyLevel::Medium);
    }

    #[test]
    fn focus_session_rejects_negative_duration() {
        let err = FocusSessionRecord::new(None, at(2024, 6, 3, 9), -10).unwrap_err();
        assert!(matches!(err, ValidationError::NegativeDuration { value: -10, .. }));
        let ok = FocusSessionRecord::new(None, at(2024, 6, 3, 9), 25).unwrap();
        assert_eq!(ok.ended_at, Some(at(2024, 6, 3, 9) + chrono::Duration::minutes(25)));
    }

    #[test]
    fn enum_parsing_is_case_insensitive() {
        assert_eq!(EnergyLevel::parse("HIGH"), Some(EnergyLevel::High));
        assert_eq!(Mood::parse(" Neutral "), Some(Mood::Neutral));
        assert_eq!(Mood::parse("ecstatic"), None);
    }
}
