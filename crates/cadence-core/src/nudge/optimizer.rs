//! Data-driven reminder times.
//!
//! For each candidate hour the optimizer blends total focus minutes and mean
//! self-reported energy from the trailing window:
//!
//! ```text
//! composite = 0.6 * focus / max(focus) + 0.4 * energy / max(energy)
//! ```
//!
//! The best hours become the anchors of the recommended nudge set.

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::types::{weekdays, NudgeTime, NudgeType, ScheduledNudge};
use crate::history::{EnergyEntry, FocusSessionRecord};

/// A recommended hour with its rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalTimeSlot {
    pub hour: u8,
    /// round(composite * 100)
    pub confidence: u8,
    pub score: f64,
    pub reason: String,
    /// Weekdays with the most focus at this hour, best first
    pub best_days_of_week: Vec<u8>,
}

/// Per-hour inputs to the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourProfile {
    pub hour: u8,
    pub focus_minutes: i64,
    pub energy_samples: usize,
    /// Mean energy (1-10); neutral when there are no samples
    pub average_energy: f64,
    pub composite: f64,
    pub best_days_of_week: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct NudgeTimeOptimizer {
    pub lookback_days: i64,
    /// Inclusive range of candidate hours
    pub first_hour: u8,
    pub last_hour: u8,
    pub focus_weight: f64,
    pub energy_weight: f64,
    pub slot_count: usize,
    /// Anchor for the fixed task-suggestion nudge
    pub task_suggestion_hour: u8,
}

impl Default for NudgeTimeOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl NudgeTimeOptimizer {
    pub fn new() -> Self {
        Self {
            lookback_days: 30,
            first_hour: 6,
            last_hour: 22,
            focus_weight: 0.6,
            energy_weight: 0.4,
            slot_count: 3,
            task_suggestion_hour: 14,
        }
    }

    pub fn with_lookback_days(lookback_days: i64) -> Self {
        Self {
            lookback_days,
            ..Self::new()
        }
    }

    /// Composite inputs for every candidate hour, in hour order.
    pub fn hour_profiles(
        &self,
        focus: &[FocusSessionRecord],
        energy: &[EnergyEntry],
        now: NaiveDateTime,
    ) -> Vec<HourProfile> {
        let since = now - Duration::days(self.lookback_days);
        let in_window = |t: NaiveDateTime| t >= since && t <= now;

        let mut focus_by_hour = [0i64; 24];
        let mut focus_by_hour_day = [[0i64; 7]; 24];
        for session in focus.iter().filter(|s| in_window(s.started_at)) {
            if session.duration_minutes < 0 {
                tracing::warn!(id = %session.id, "ignoring focus session with negative duration");
                continue;
            }
            let hour = session.hour() as usize;
            focus_by_hour[hour] += session.duration_minutes;
            focus_by_hour_day[hour][session.day_of_week() as usize] += session.duration_minutes;
        }

        let mut energy_sum = [0f64; 24];
        let mut energy_count = [0usize; 24];
        for entry in energy.iter().filter(|e| in_window(e.timestamp)) {
            let hour = entry.timestamp.hour() as usize;
            energy_sum[hour] += f64::from(entry.clamped_level());
            energy_count[hour] += 1;
        }

        let hours = self.first_hour..=self.last_hour.min(23);
        let average_energy = |h: usize| {
            if energy_count[h] == 0 {
                f64::from(EnergyEntry::NEUTRAL_LEVEL)
            } else {
                energy_sum[h] / energy_count[h] as f64
            }
        };

        let max_focus = hours.clone().map(|h| focus_by_hour[h as usize]).max().unwrap_or(0);
        let max_energy = hours
            .clone()
            .map(|h| average_energy(h as usize))
            .fold(0.0, f64::max);

        hours
            .map(|hour| {
                let h = hour as usize;
                let norm_focus = if max_focus > 0 {
                    focus_by_hour[h] as f64 / max_focus as f64
                } else {
                    0.0
                };
                let norm_energy = if max_energy > 0.0 {
                    average_energy(h) / max_energy
                } else {
                    0.0
                };
                HourProfile {
                    hour,
                    focus_minutes: focus_by_hour[h],
                    energy_samples: energy_count[h],
                    average_energy: average_energy(h),
                    composite: self.focus_weight * norm_focus + self.energy_weight * norm_energy,
                    best_days_of_week: best_days(&focus_by_hour_day[h]),
                }
            })
            .collect()
    }

    /// Top hours by composite score; ties go to the earlier hour.
    pub fn find_optimal_time_slots(
        &self,
        focus: &[FocusSessionRecord],
        energy: &[EnergyEntry],
        now: NaiveDateTime,
    ) -> Vec<OptimalTimeSlot> {
        let mut profiles = self.hour_profiles(focus, energy, now);
        profiles.sort_by(|a, b| b.composite.total_cmp(&a.composite));

        let slots: Vec<OptimalTimeSlot> = profiles
            .into_iter()
            .take(self.slot_count)
            .map(|p| OptimalTimeSlot {
                hour: p.hour,
                confidence: (p.composite * 100.0).round().clamp(0.0, 100.0) as u8,
                score: p.composite,
                reason: slot_reason(&p),
                best_days_of_week: p.best_days_of_week,
            })
            .collect();

        tracing::debug!(
            hours = ?slots.iter().map(|s| s.hour).collect::<Vec<_>>(),
            "optimal time slots"
        );
        slots
    }

    /// Hours of the computed slots, for throttle delay compression.
    pub fn optimal_hours(&self, slots: &[OptimalTimeSlot]) -> Vec<u8> {
        slots.iter().map(|s| s.hour).collect()
    }

    /// Focus reminder at slot 1, energy check at slot 2, plus the fixed
    /// afternoon task suggestion.
    pub fn generate_recommended_nudges(&self, slots: &[OptimalTimeSlot]) -> Vec<ScheduledNudge> {
        let mut nudges = Vec::with_capacity(3);

        if let Some(slot) = slots.first() {
            nudges.push(ScheduledNudge::new(
                NudgeTime::at_hour(slot.hour),
                NudgeType::FocusReminder,
                "Your focus window is starting. Pick one task and begin.",
                repeat_days_for(slot),
            ));
        }
        if let Some(slot) = slots.get(1) {
            nudges.push(ScheduledNudge::new(
                NudgeTime::at_hour(slot.hour),
                NudgeType::EnergyCheck,
                "Quick check: how is your energy right now?",
                repeat_days_for(slot),
            ));
        }
        nudges.push(ScheduledNudge::new(
            NudgeTime::at_hour(self.task_suggestion_hour),
            NudgeType::TaskSuggestion,
            "Need a next step? There's a task that fits your afternoon.",
            weekdays(),
        ));

        nudges
    }
}

fn repeat_days_for(slot: &OptimalTimeSlot) -> BTreeSet<u8> {
    if slot.best_days_of_week.is_empty() {
        weekdays()
    } else {
        slot.best_days_of_week.iter().copied().collect()
    }
}

/// Up to three days with focus at this hour, most minutes first.
fn best_days(minutes_by_day: &[i64; 7]) -> Vec<u8> {
    let mut days: Vec<(u8, i64)> = minutes_by_day
        .iter()
        .enumerate()
        .filter(|(_, m)| **m > 0)
        .map(|(d, m)| (d as u8, *m))
        .collect();
    days.sort_by(|a, b| b.1.cmp(&a.1));
    days.into_iter().take(3).map(|(d, _)| d).collect()
}

fn slot_reason(profile: &HourProfile) -> String {
    let at = format!("{:02}:00", profile.hour);
    match (profile.focus_minutes > 0, profile.energy_samples > 0) {
        (true, true) => format!("You focus well and feel energetic around {at}."),
        (true, false) => format!("Your longest focus sessions tend to happen around {at}."),
        (false, true) => format!("Your energy is usually good around {at}."),
        (false, false) => "Based on a typical daily schedule.".to_string(),
    }
}
