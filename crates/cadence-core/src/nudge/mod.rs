//! Reminder timing: data-derived nudge schedules and the ad-hoc throttle.

mod effectiveness;
mod optimizer;
mod throttle;
mod types;

pub use effectiveness::{EngagementRates, HourEffectiveness, NudgeEffectiveness, TypeEffectiveness};
pub use optimizer::{HourProfile, NudgeTimeOptimizer, OptimalTimeSlot};
pub use throttle::{
    BlockReason, NotificationStyle, NotificationThrottle, ThrottleConfig, ThrottleDecision,
};
pub use types::{weekdays, NotificationHistoryEntry, NudgeTime, NudgeType, ScheduledNudge};
