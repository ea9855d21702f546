//! Nudge and notification records.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

/// Kind of notification, shared by scheduled nudges and ad-hoc sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeType {
    FocusReminder,
    EnergyCheck,
    TaskSuggestion,
    CheckIn,
    Encouragement,
}

impl NudgeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NudgeType::FocusReminder => "focus_reminder",
            NudgeType::EnergyCheck => "energy_check",
            NudgeType::TaskSuggestion => "task_suggestion",
            NudgeType::CheckIn => "check_in",
            NudgeType::Encouragement => "encouragement",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "focus_reminder" => Some(NudgeType::FocusReminder),
            "energy_check" => Some(NudgeType::EnergyCheck),
            "task_suggestion" => Some(NudgeType::TaskSuggestion),
            "check_in" => Some(NudgeType::CheckIn),
            "encouragement" => Some(NudgeType::Encouragement),
            _ => None,
        }
    }
}

/// Wall-clock time of day, written as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NudgeTime {
    hour: u8,
    minute: u8,
}

impl NudgeTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidTimeOfDay(format!("{hour}:{minute}")));
        }
        Ok(Self { hour, minute })
    }

    /// Top of the hour. Hours past 23 wrap.
    pub fn at_hour(hour: u8) -> Self {
        Self {
            hour: hour % 24,
            minute: 0,
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl fmt::Display for NudgeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for NudgeTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidTimeOfDay(s.to_string());
        let (h, m) = s.split_once(':').ok_or_else(invalid)?;
        let hour = h.trim().parse::<u8>().map_err(|_| invalid())?;
        let minute = m.trim().parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl Serialize for NudgeTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NudgeTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Monday through Friday.
pub fn weekdays() -> BTreeSet<u8> {
    (1..=5).collect()
}

/// A recurring reminder at a fixed time of day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledNudge {
    pub id: String,
    pub scheduled_time: NudgeTime,
    pub nudge_type: NudgeType,
    pub message: String,
    pub enabled: bool,
    /// Days of week (0-6, Sunday=0)
    pub repeat_days: BTreeSet<u8>,
}

impl ScheduledNudge {
    pub fn new(
        scheduled_time: NudgeTime,
        nudge_type: NudgeType,
        message: impl Into<String>,
        repeat_days: BTreeSet<u8>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            scheduled_time,
            nudge_type,
            message: message.into(),
            enabled: true,
            repeat_days: repeat_days.into_iter().filter(|d| *d < 7).collect(),
        }
    }
}

/// Audit entry for a sent notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationHistoryEntry {
    pub id: String,
    pub nudge_type: NudgeType,
    pub sent_at: NaiveDateTime,
    /// When the sink fires it; never before `sent_at`
    pub deliver_at: NaiveDateTime,
    #[serde(default)]
    pub acknowledged_at: Option<NaiveDateTime>,
    pub dismissed: bool,
    pub action_taken: bool,
}

impl NotificationHistoryEntry {
    pub fn new(nudge_type: NudgeType, sent_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            nudge_type,
            sent_at,
            deliver_at: sent_at,
            acknowledged_at: None,
            dismissed: false,
            action_taken: false,
        }
    }

    pub fn with_delivery_at(mut self, deliver_at: NaiveDateTime) -> Self {
        self.deliver_at = deliver_at.max(self.sent_at);
        self
    }

    pub fn sent_hour(&self) -> u8 {
        self.sent_at.hour() as u8
    }

    /// Dismissed with no follow-up action.
    pub fn ignored(&self) -> bool {
        self.dismissed && !self.action_taken
    }
}
