//! # Cadence Core Library
//!
//! Behavioral analytics and adaptive engagement for a focus/productivity app.
//! Everything the `cadence` CLI does goes through this library.
//!
//! ## Architecture
//!
//! - **History**: typed completion, energy, mood and focus-session records
//!   behind the [`HistoryStore`] read port
//! - **Analysis**: hourly/weekday patterns and mood correlations, computed on
//!   demand from a [`HistorySnapshot`]
//! - **Engagement**: task suggestions, proactive check-ins, nudge time
//!   optimization and notification throttling
//! - **Timer**: a wall-clock focus timer whose finished sessions feed history
//! - **Storage**: SQLite persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`CadenceEngine`]: facade wiring the components to the I/O ports
//! - [`PatternAnalyzer`] / [`CorrelationEngine`]: history analysis
//! - [`SuggestionScorer`]: contextual task ranking
//! - [`CheckInScheduler`]: proactive check-in rules
//! - [`NudgeTimeOptimizer`] / [`NotificationThrottle`]: nudge timing and gating

pub mod checkin;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod notify;
pub mod nudge;
pub mod patterns;
pub mod storage;
pub mod suggestion;
pub mod timer;

pub use checkin::{CheckInConfig, CheckInProfile, CheckInScheduler, CheckInType, ProactiveCheckIn};
pub use engine::{CadenceEngine, NotificationFeedback, NudgeRecommendation, SmartNotification};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use events::Event;
pub use history::{
    CompletionRecord, EnergyEntry, EnergyLevel, FocusSessionRecord, HistorySnapshot, HistoryStore,
    MemoryHistoryStore, Mood, MoodEntry, TimeRange,
};
pub use notify::{MemorySink, NotificationRequest, NotificationSink};
pub use nudge::{
    NotificationHistoryEntry, NotificationThrottle, NudgeEffectiveness, NudgeTime,
    NudgeTimeOptimizer, NudgeType, OptimalTimeSlot, ScheduledNudge, ThrottleDecision,
};
pub use patterns::{CorrelationEngine, CorrelationReport, PatternAnalyzer, PatternData};
pub use storage::{Config, EngineDb, HistoryDb, ScheduleStore};
pub use suggestion::{
    CandidateTask, ContextBuilder, LiveSignals, SuggestionContext, SuggestionScorer,
    TaskSuggestion,
};
pub use timer::{FocusTimer, TimerState};
