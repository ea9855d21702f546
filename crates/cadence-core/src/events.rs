use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

/// Every focus-timer state change produces an Event.
/// Front ends render them; the engine turns terminal ones into history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        task_id: Option<String>,
        duration_secs: u64,
        at: NaiveDateTime,
    },
    TimerPaused {
        remaining_ms: u64,
        at: NaiveDateTime,
    },
    TimerResumed {
        remaining_ms: u64,
        at: NaiveDateTime,
    },
    TimerCompleted {
        task_id: Option<String>,
        focused_ms: u64,
        at: NaiveDateTime,
    },
    /// Stopped by the user before the countdown ran out.
    TimerStopped {
        remaining_ms: u64,
        focused_ms: u64,
        at: NaiveDateTime,
    },
    TimerReset {
        at: NaiveDateTime,
    },
    StateSnapshot {
        state: TimerState,
        task_id: Option<String>,
        remaining_ms: u64,
        total_ms: u64,
        progress_pct: f64,
        at: NaiveDateTime,
    },
}

impl Event {
    pub fn at(&self) -> NaiveDateTime {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerResumed { at, .. }
            | Event::TimerCompleted { at, .. }
            | Event::TimerStopped { at, .. }
            | Event::TimerReset { at }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }

    /// Completed or stopped.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::TimerCompleted { .. } | Event::TimerStopped { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn serializes_with_type_tag() {
        let at = NaiveDate::from_ymd_opt(2024, 6, 18)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let event = Event::TimerPaused {
            remaining_ms: 1000,
            at,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TimerPaused");
        assert_eq!(json["remaining_ms"], 1000);
        assert_eq!(event.at(), at);
        assert!(!event.is_terminal());
    }
}
