//! Contextual task scoring.
//!
//! Every open task starts at 50 and collects additive adjustments in a fixed
//! order. The sum is clamped to [0, 100] and confidence is score / 100.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::context::{ActivityLevel, CalendarProximity, SuggestionContext, TimeOfDay};
use crate::history::{EnergyLevel, Mood};

pub const BASE_SCORE: f64 = 50.0;

/// A task the user could work on next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTask {
    pub id: String,
    pub title: String,
    pub energy: EnergyLevel,
    #[serde(default)]
    pub is_micro_step: bool,
    #[serde(default)]
    pub completed: bool,
    pub created_at: NaiveDateTime,
}

impl CandidateTask {
    fn is_gentle(&self) -> bool {
        self.is_micro_step || self.energy == EnergyLevel::Low
    }
}

/// A ranked suggestion with its rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSuggestion {
    pub id: String,
    pub task_id: String,
    pub task_title: String,
    pub reason_text: String,
    pub score: f64,
    /// score / 100
    pub confidence: f64,
    pub context: SuggestionContext,
}

/// Energy match (+30 exact, +10 one step down, -20 for heavy work on low energy).
pub fn energy_match_score(task: &CandidateTask, ctx: &SuggestionContext) -> f64 {
    match (ctx.current_energy, task.energy) {
        (a, b) if a == b => 30.0,
        (EnergyLevel::High, EnergyLevel::Medium) | (EnergyLevel::Medium, EnergyLevel::Low) => 10.0,
        (EnergyLevel::Low, EnergyLevel::High) => -20.0,
        _ => 0.0,
    }
}

pub fn peak_hour_score(task: &CandidateTask, ctx: &SuggestionContext) -> f64 {
    if ctx.is_peak_hour && task.energy == EnergyLevel::High {
        20.0
    } else {
        0.0
    }
}

pub fn mood_score(task: &CandidateTask, ctx: &SuggestionContext) -> f64 {
    match ctx.current_mood {
        Mood::Low if task.is_gentle() => 25.0,
        Mood::Low if task.energy == EnergyLevel::High => -15.0,
        Mood::High if task.energy == EnergyLevel::High => 15.0,
        _ => 0.0,
    }
}

pub fn time_of_day_score(task: &CandidateTask, ctx: &SuggestionContext) -> f64 {
    match (ctx.time_of_day, task.energy) {
        (TimeOfDay::Morning, EnergyLevel::High) => 10.0,
        (TimeOfDay::Evening, EnergyLevel::Low) => 10.0,
        (TimeOfDay::Night, EnergyLevel::High) => -20.0,
        _ => 0.0,
    }
}

pub fn calendar_score(task: &CandidateTask, ctx: &SuggestionContext) -> f64 {
    match ctx.calendar_proximity {
        CalendarProximity::BusySoon if task.is_gentle() => 15.0,
        CalendarProximity::BusySoon => -10.0,
        CalendarProximity::Free if task.energy == EnergyLevel::High => 10.0,
        _ => 0.0,
    }
}

pub fn restart_score(task: &CandidateTask, ctx: &SuggestionContext) -> f64 {
    if ctx.recent_activity_level == ActivityLevel::Low && task.is_micro_step {
        20.0
    } else {
        0.0
    }
}

pub fn micro_step_score(task: &CandidateTask) -> f64 {
    if task.is_micro_step {
        10.0
    } else {
        0.0
    }
}

/// `min(age_days * 2, 10)` once a task is more than two days old.
pub fn age_score(task: &CandidateTask, now: NaiveDateTime) -> f64 {
    let age_days = (now - task.created_at).num_days();
    if age_days > 2 {
        (age_days as f64 * 2.0).min(10.0)
    } else {
        0.0
    }
}

/// Unclamped sum of all adjustments.
pub fn raw_score(task: &CandidateTask, ctx: &SuggestionContext, now: NaiveDateTime) -> f64 {
    BASE_SCORE
        + energy_match_score(task, ctx)
        + peak_hour_score(task, ctx)
        + mood_score(task, ctx)
        + time_of_day_score(task, ctx)
        + calendar_score(task, ctx)
        + restart_score(task, ctx)
        + micro_step_score(task)
        + age_score(task, now)
}

pub fn calculate_score(task: &CandidateTask, ctx: &SuggestionContext, now: NaiveDateTime) -> f64 {
    raw_score(task, ctx, now).clamp(0.0, 100.0)
}

type ReasonRule = (fn(&CandidateTask, &SuggestionContext, NaiveDateTime) -> bool, &'static str);

/// Checked in order; the first match supplies the rationale.
const REASONS: &[ReasonRule] = &[
    (
        |t, c, _| c.calendar_proximity == CalendarProximity::BusySoon && t.is_gentle(),
        "Something is coming up soon, and this fits in the gap.",
    ),
    (
        |t, c, _| c.current_mood == Mood::Low && t.is_gentle(),
        "A gentle task for when you're not feeling your best.",
    ),
    (
        |t, c, _| c.is_peak_hour && t.energy == EnergyLevel::High,
        "This is one of your peak hours, a good time for demanding work.",
    ),
    (
        |t, c, _| c.recent_activity_level == ActivityLevel::Low && t.is_micro_step,
        "A quick win to get you moving again.",
    ),
    (
        |t, c, _| c.current_energy == t.energy,
        "Matches your current energy level.",
    ),
    (
        |t, c, _| c.time_of_day == TimeOfDay::Morning && t.energy == EnergyLevel::High,
        "Mornings suit focused work.",
    ),
    (
        |t, c, _| c.time_of_day == TimeOfDay::Evening && t.energy == EnergyLevel::Low,
        "A light task to wind down the day.",
    ),
    (
        |t, _, now| (now - t.created_at).num_days() > 2,
        "This one has been waiting a while.",
    ),
];

pub const FALLBACK_REASON: &str = "A good next step.";

pub fn reason_for(task: &CandidateTask, ctx: &SuggestionContext, now: NaiveDateTime) -> &'static str {
    REASONS
        .iter()
        .find(|(matches, _)| matches(task, ctx, now))
        .map(|(_, text)| *text)
        .unwrap_or(FALLBACK_REASON)
}

/// Ranks open tasks against a context.
#[derive(Debug, Clone)]
pub struct SuggestionScorer {
    pub top_n: usize,
}

impl Default for SuggestionScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SuggestionScorer {
    pub fn new() -> Self {
        Self { top_n: 3 }
    }

    pub fn with_top_n(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Top suggestions, highest score first. Equal scores keep input order.
    pub fn suggest(
        &self,
        tasks: &[CandidateTask],
        ctx: &SuggestionContext,
        now: NaiveDateTime,
    ) -> Vec<TaskSuggestion> {
        let mut scored: Vec<(&CandidateTask, f64)> = tasks
            .iter()
            .filter(|t| !t.completed)
            .map(|t| (t, calculate_score(t, ctx, now)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let suggestions: Vec<TaskSuggestion> = scored
            .into_iter()
            .take(self.top_n)
            .map(|(task, score)| TaskSuggestion {
                id: Uuid::new_v4().to_string(),
                task_id: task.id.clone(),
                task_title: task.title.clone(),
                reason_text: reason_for(task, ctx, now).to_string(),
                score,
                confidence: score / 100.0,
                context: ctx.clone(),
            })
            .collect();

        tracing::debug!(
            candidates = tasks.len(),
            returned = suggestions.len(),
            "scored task suggestions"
        );
        suggestions
    }
}
