//! Point-in-time situational context for suggestions.

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::history::{EnergyLevel, Mood};
use crate::patterns::PatternData;

/// Coarse part of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// morning [5,12), afternoon [12,17), evening [17,21), otherwise night.
    pub fn from_hour(hour: u8) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

/// How recently the user did anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    High,
    Medium,
    Low,
}

impl ActivityLevel {
    /// <15 minutes high, <60 medium, otherwise (or never) low.
    pub fn from_idle_minutes(minutes: Option<i64>) -> Self {
        match minutes {
            Some(m) if m < 15 => ActivityLevel::High,
            Some(m) if m < 60 => ActivityLevel::Medium,
            _ => ActivityLevel::Low,
        }
    }
}

/// Relation of now to the nearest calendar events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarProximity {
    JustFinished,
    BusySoon,
    Free,
}

/// An entry from the optional calendar feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Context a suggestion was scored against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionContext {
    pub time_of_day: TimeOfDay,
    pub current_energy: EnergyLevel,
    pub current_mood: Mood,
    pub is_peak_hour: bool,
    pub recent_activity_level: ActivityLevel,
    pub calendar_proximity: CalendarProximity,
}

/// Live signals supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSignals {
    pub energy: EnergyLevel,
    pub mood: Mood,
    pub last_activity: Option<NaiveDateTime>,
    pub calendar: Vec<CalendarEvent>,
}

impl Default for LiveSignals {
    fn default() -> Self {
        Self {
            energy: EnergyLevel::Medium,
            mood: Mood::Neutral,
            last_activity: None,
            calendar: Vec::new(),
        }
    }
}

/// Builds [`SuggestionContext`] values.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    pub calendar_window: Duration,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            calendar_window: Duration::minutes(30),
        }
    }

    pub fn build(
        &self,
        now: NaiveDateTime,
        patterns: &PatternData,
        signals: &LiveSignals,
    ) -> SuggestionContext {
        let hour = now.hour() as u8;
        let idle = signals
            .last_activity
            .map(|last| (now - last).num_minutes().max(0));

        SuggestionContext {
            time_of_day: TimeOfDay::from_hour(hour),
            current_energy: signals.energy,
            current_mood: signals.mood,
            is_peak_hour: patterns.is_peak_hour(hour),
            recent_activity_level: ActivityLevel::from_idle_minutes(idle),
            calendar_proximity: self.calendar_proximity(now, &signals.calendar),
        }
    }

    /// An event starting within the window dominates one that just ended.
    pub fn calendar_proximity(&self, now: NaiveDateTime, events: &[CalendarEvent]) -> CalendarProximity {
        let busy_soon = events
            .iter()
            .any(|e| e.start > now && e.start <= now + self.calendar_window);
        if busy_soon {
            return CalendarProximity::BusySoon;
        }

        let just_finished = events
            .iter()
            .any(|e| e.end <= now && e.end >= now - self.calendar_window);
        if just_finished {
            CalendarProximity::JustFinished
        } else {
            CalendarProximity::Free
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternAnalyzer;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn event(start: NaiveDateTime, end: NaiveDateTime) -> CalendarEvent {
        CalendarEvent {
            title: "Meeting".to_string(),
            start,
            end,
        }
    }

    #[test]
    fn time_of_day_boundaries() {
        assert_eq!(TimeOfDay::from_hour(4), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(20), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(21), TimeOfDay::Night);
    }

    #[test]
    fn activity_level_thresholds() {
        assert_eq!(ActivityLevel::from_idle_minutes(Some(14)), ActivityLevel::High);
        assert_eq!(ActivityLevel::from_idle_minutes(Some(15)), ActivityLevel::Medium);
        assert_eq!(ActivityLevel::from_idle_minutes(Some(59)), ActivityLevel::Medium);
        assert_eq!(ActivityLevel::from_idle_minutes(Some(60)), ActivityLevel::Low);
        assert_eq!(ActivityLevel::from_idle_minutes(None), ActivityLevel::Low);
    }

    #[test]
    fn calendar_busy_soon_beats_just_finished() {
        let builder = ContextBuilder::new();
        let now = at(10, 0);
        let ended = event(at(9, 0), at(9, 50));
        let upcoming = event(at(10, 20), at(11, 0));

        assert_eq!(
            builder.calendar_proximity(now, &[ended.clone()]),
            CalendarProximity::JustFinished
        );
        assert_eq!(
            builder.calendar_proximity(now, &[upcoming.clone()]),
            CalendarProximity::BusySoon
        );
        assert_eq!(
            builder.calendar_proximity(now, &[ended, upcoming]),
            CalendarProximity::BusySoon
        );
        assert_eq!(
            builder.calendar_proximity(now, &[event(at(13, 0), at(14, 0))]),
            CalendarProximity::Free
        );
    }

    #[test]
    fn build_marks_peak_hours() {
        let patterns = PatternAnalyzer::new().analyze(&[], at(10, 0));
        let signals = LiveSignals {
            last_activity: Some(at(9, 50)),
            ..Default::default()
        };
        let ctx = ContextBuilder::new().build(at(10, 0), &patterns, &signals);
        assert!(ctx.is_peak_hour);
        assert_eq!(ctx.time_of_day, TimeOfDay::Morning);
        assert_eq!(ctx.recent_activity_level, ActivityLevel::High);
        assert_eq!(ctx.calendar_proximity, CalendarProximity::Free);
    }
}
