//! Context-aware task suggestions.
//!
//! Suggestions are computed on demand from a [`SuggestionContext`]; nothing is
//! precomputed or stored.

mod context;
mod scoring;

pub use context::{
    ActivityLevel, CalendarEvent, CalendarProximity, ContextBuilder, LiveSignals,
    SuggestionContext, TimeOfDay,
};
pub use scoring::{calculate_score, reason_for, CandidateTask, SuggestionScorer, TaskSuggestion};
