//! Anti-fatigue gate for ad-hoc smart notifications.
//!
//! Scheduled nudges are not throttled; only one-off sends pass through here.

use chrono::{Duration, NaiveDateTime, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::types::NotificationHistoryEntry;
use crate::history::Mood;

/// Delivery tone and cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStyle {
    /// Long, sparse delays
    Gentle,
    /// Irregular delays that resist habituation
    #[default]
    Variable,
    /// Short, regular delays
    Persistent,
}

impl NotificationStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationStyle::Gentle => "gentle",
            NotificationStyle::Variable => "variable",
            NotificationStyle::Persistent => "persistent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gentle" => Some(NotificationStyle::Gentle),
            "variable" => Some(NotificationStyle::Variable),
            "persistent" => Some(NotificationStyle::Persistent),
            _ => None,
        }
    }

    /// Candidate delays in minutes.
    pub fn delay_choices(self) -> &'static [i64] {
        match self {
            NotificationStyle::Gentle => &[15, 30, 45, 60],
            NotificationStyle::Variable => &[2, 7, 13, 25, 40],
            NotificationStyle::Persistent => &[5, 5, 10],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Quiet hours start (inclusive)
    pub quiet_start_hour: u8,
    /// Quiet hours end (exclusive)
    pub quiet_end_hour: u8,
    /// Sends allowed in any trailing 60 minutes
    pub max_per_hour: usize,
    pub dismissal_window_minutes: i64,
    /// Ignored notifications inside the window that suppress the next one
    pub dismissal_threshold: usize,
    pub style: NotificationStyle,
    /// Upper bound of the compressed delay at an optimal hour
    pub optimal_hour_max_delay: i64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            quiet_start_hour: 22,
            quiet_end_hour: 7,
            max_per_hour: 3,
            dismissal_window_minutes: 30,
            dismissal_threshold: 2,
            style: NotificationStyle::Variable,
            optimal_hour_max_delay: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// Smart notifications are turned off
    Disabled,
    QuietHours,
    RateLimited,
    Fatigue,
}

impl BlockReason {
    pub fn describe(self) -> &'static str {
        match self {
            BlockReason::Disabled => "smart notifications are disabled",
            BlockReason::QuietHours => "quiet hours are active",
            BlockReason::RateLimited => "too many notifications in the last hour",
            BlockReason::Fatigue => "recent notifications were dismissed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ThrottleDecision {
    Blocked {
        reason: BlockReason,
    },
    Allowed {
        style: NotificationStyle,
        delay_minutes: i64,
        fire_at: NaiveDateTime,
    },
}

impl ThrottleDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ThrottleDecision::Allowed { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotificationThrottle {
    config: ThrottleConfig,
}

impl NotificationThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ThrottleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Quiet window check with wraparound across midnight. Equal start and
    /// end disables quiet hours.
    pub fn is_quiet_hour(&self, hour: u8) -> bool {
        let (start, end) = (self.config.quiet_start_hour, self.config.quiet_end_hour);
        if start == end {
            false
        } else if start < end {
            hour >= start && hour < end
        } else {
            hour >= start || hour < end
        }
    }

    /// Deliveries in the trailing 60 minutes plus those still pending.
    ///
    /// A new notification fires at or after `now`, so any 60-minute window
    /// holding it can only share it with entries counted here.
    pub fn deliveries_in_last_hour(
        &self,
        history: &[NotificationHistoryEntry],
        now: NaiveDateTime,
    ) -> usize {
        let since = now - Duration::minutes(60);
        history.iter().filter(|e| e.deliver_at > since).count()
    }

    pub fn recently_ignored(&self, history: &[NotificationHistoryEntry], now: NaiveDateTime) -> usize {
        let since = now - Duration::minutes(self.config.dismissal_window_minutes);
        history
            .iter()
            .filter(|e| e.sent_at >= since && e.sent_at <= now && e.ignored())
            .count()
    }

    /// Low mood always gets the gentlest tone.
    pub fn effective_style(&self, mood: Option<Mood>) -> NotificationStyle {
        if mood == Some(Mood::Low) {
            NotificationStyle::Gentle
        } else {
            self.config.style
        }
    }

    pub fn blocked_reason(
        &self,
        now: NaiveDateTime,
        history: &[NotificationHistoryEntry],
    ) -> Option<BlockReason> {
        if self.is_quiet_hour(now.hour() as u8) {
            return Some(BlockReason::QuietHours);
        }
        if self.deliveries_in_last_hour(history, now) >= self.config.max_per_hour {
            return Some(BlockReason::RateLimited);
        }
        if self.recently_ignored(history, now) >= self.config.dismissal_threshold {
            return Some(BlockReason::Fatigue);
        }
        None
    }

    /// Decide whether an ad-hoc notification may fire, and when.
    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        now: NaiveDateTime,
        mood: Option<Mood>,
        history: &[NotificationHistoryEntry],
        optimal_hours: &[u8],
        rng: &mut R,
    ) -> ThrottleDecision {
        if let Some(reason) = self.blocked_reason(now, history) {
            tracing::debug!(reason = reason.describe(), "notification throttled");
            return ThrottleDecision::Blocked { reason };
        }

        let style = self.effective_style(mood);
        let delay_minutes = if optimal_hours.contains(&(now.hour() as u8)) {
            rng.gen_range(0..=self.config.optimal_hour_max_delay.max(0))
        } else {
            let choices = style.delay_choices();
            choices[rng.gen_range(0..choices.len())]
        };

        ThrottleDecision::Allowed {
            style,
            delay_minutes,
            fire_at: now + Duration::minutes(delay_minutes),
        }
    }
}
