//! Focus timer implementation.
//!
//! The timer is a wall-clock state machine. It owns no threads and reads no
//! clock: every command takes `now`, and the caller drives `tick()`.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused -> (Completed | Stopped)
//! ```
//!
//! Commands that do not apply to the current state return `None` and leave
//! the timer untouched, so a redundant stop or a late tick never double-fires.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::history::FocusSessionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
}

impl TimerState {
    pub fn is_finished(self) -> bool {
        matches!(self, TimerState::Completed | TimerState::Stopped)
    }
}

/// Single focus-session countdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusTimer {
    #[serde(default)]
    task_id: Option<String>,
    total_ms: u64,
    state: TimerState,
    remaining_ms: u64,
    /// Time actually spent running, excluding pauses.
    focused_ms: u64,
    #[serde(default)]
    started_at: Option<NaiveDateTime>,
    /// Last time elapsed time was flushed while running.
    #[serde(default)]
    last_tick_at: Option<NaiveDateTime>,
    #[serde(default)]
    ended_at: Option<NaiveDateTime>,
}

impl FocusTimer {
    pub fn new(duration_minutes: u32) -> Self {
        let total_ms = u64::from(duration_minutes) * 60 * 1000;
        Self {
            task_id: None,
            total_ms,
            state: TimerState::Idle,
            remaining_ms: total_ms,
            focused_ms: 0,
            started_at: None,
            last_tick_at: None,
            ended_at: None,
        }
    }

    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn focused_ms(&self) -> u64 {
        self.focused_ms
    }

    pub fn started_at(&self) -> Option<NaiveDateTime> {
        self.started_at
    }

    /// 0.0 .. 100.0
    pub fn progress_pct(&self) -> f64 {
        if self.total_ms == 0 {
            return 0.0;
        }
        (1.0 - self.remaining_ms as f64 / self.total_ms as f64) * 100.0
    }

    pub fn snapshot(&self, now: NaiveDateTime) -> Event {
        Event::StateSnapshot {
            state: self.state,
            task_id: self.task_id.clone(),
            remaining_ms: self.remaining_ms,
            total_ms: self.total_ms,
            progress_pct: self.progress_pct(),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now: NaiveDateTime) -> Option<Event> {
        if self.state != TimerState::Idle {
            return None;
        }
        self.state = TimerState::Running;
        self.started_at = Some(now);
        self.last_tick_at = Some(now);
        Some(Event::TimerStarted {
            task_id: self.task_id.clone(),
            duration_secs: self.total_ms / 1000,
            at: now,
        })
    }

    pub fn pause(&mut self, now: NaiveDateTime) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.flush_elapsed(now);
        self.state = TimerState::Paused;
        self.last_tick_at = None;
        Some(Event::TimerPaused {
            remaining_ms: self.remaining_ms,
            at: now,
        })
    }

    pub fn resume(&mut self, now: NaiveDateTime) -> Option<Event> {
        if self.state != TimerState::Paused {
            return None;
        }
        self.state = TimerState::Running;
        self.last_tick_at = Some(now);
        Some(Event::TimerResumed {
            remaining_ms: self.remaining_ms,
            at: now,
        })
    }

    pub fn stop(&mut self, now: NaiveDateTime) -> Option<Event> {
        match self.state {
            TimerState::Running | TimerState::Paused => {
                if self.state == TimerState::Running {
                    self.flush_elapsed(now);
                }
                self.state = TimerState::Stopped;
                self.last_tick_at = None;
                self.ended_at = Some(now);
                Some(Event::TimerStopped {
                    remaining_ms: self.remaining_ms,
                    focused_ms: self.focused_ms,
                    at: now,
                })
            }
            _ => None,
        }
    }

    /// Back to Idle with the full duration.
    pub fn reset(&mut self, now: NaiveDateTime) -> Option<Event> {
        self.state = TimerState::Idle;
        self.remaining_ms = self.total_ms;
        self.focused_ms = 0;
        self.started_at = None;
        self.last_tick_at = None;
        self.ended_at = None;
        Some(Event::TimerReset { at: now })
    }

    /// Call periodically. Returns `Some(Event::TimerCompleted)` exactly once,
    /// on the tick that exhausts the countdown.
    pub fn tick(&mut self, now: NaiveDateTime) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.flush_elapsed(now);
        if self.remaining_ms > 0 {
            return None;
        }
        self.state = TimerState::Completed;
        self.last_tick_at = None;
        self.ended_at = Some(now);
        Some(Event::TimerCompleted {
            task_id: self.task_id.clone(),
            focused_ms: self.focused_ms,
            at: now,
        })
    }

    /// History record for a finished session; `None` until then.
    pub fn to_record(&self) -> Option<FocusSessionRecord> {
        if !self.state.is_finished() {
            return None;
        }
        let started_at = self.started_at?;
        let minutes = (self.focused_ms / 60_000) as i64;
        let mut record = FocusSessionRecord::new(self.task_id.clone(), started_at, minutes).ok()?;
        record.ended_at = self.ended_at;
        Some(record)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_elapsed(&mut self, now: NaiveDateTime) {
        if let Some(last) = self.last_tick_at {
            // A clock that moved backwards contributes nothing.
            let elapsed = (now - last).num_milliseconds().max(0) as u64;
            let consumed = elapsed.min(self.remaining_ms);
            self.remaining_ms -= consumed;
            self.focused_ms += consumed;
            self.last_tick_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 18)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn mins(m: i64) -> NaiveDateTime {
        t0() + Duration::minutes(m)
    }

    #[test]
    fn start_pause_resume() {
        let mut timer = FocusTimer::new(25);
        assert_eq!(timer.state(), TimerState::Idle);

        assert!(timer.start(t0()).is_some());
        assert_eq!(timer.state(), TimerState::Running);

        assert!(timer.pause(mins(5)).is_some());
        assert_eq!(timer.state(), TimerState::Paused);
        assert_eq!(timer.remaining_ms(), 20 * 60 * 1000);

        assert!(timer.resume(mins(10)).is_some());
        assert_eq!(timer.state(), TimerState::Running);
        // Paused time does not count
        timer.tick(mins(15));
        assert_eq!(timer.remaining_ms(), 15 * 60 * 1000);
        assert_eq!(timer.focused_ms(), 10 * 60 * 1000);
    }

    #[test]
    fn redundant_commands_are_noops() {
        let mut timer = FocusTimer::new(25);
        assert!(timer.pause(t0()).is_none());
        assert!(timer.resume(t0()).is_none());
        assert!(timer.stop(t0()).is_none());

        timer.start(t0());
        assert!(timer.start(mins(1)).is_none());
        assert!(timer.resume(mins(1)).is_none());

        assert!(timer.stop(mins(2)).is_some());
        assert!(timer.stop(mins(3)).is_none());
        assert!(timer.start(mins(3)).is_none());
        assert!(timer.tick(mins(30)).is_none());
        assert_eq!(timer.state(), TimerState::Stopped);
    }

    #[test]
    fn completion_fires_once() {
        let mut timer = FocusTimer::new(1);
        timer.start(t0());
        assert!(timer.tick(t0() + Duration::seconds(30)).is_none());
        match timer.tick(mins(2)) {
            Some(Event::TimerCompleted { focused_ms, .. }) => assert_eq!(focused_ms, 60_000),
            other => panic!("expected completion, got {other:?}"),
        }
        assert!(timer.tick(mins(3)).is_none());
        assert!(timer.stop(mins(3)).is_none());
        assert_eq!(timer.state(), TimerState::Completed);
        assert_eq!(timer.progress_pct(), 100.0);
    }

    #[test]
    fn backwards_clock_does_not_consume_time() {
        let mut timer = FocusTimer::new(10);
        timer.start(mins(5));
        timer.tick(mins(1));
        assert_eq!(timer.remaining_ms(), 10 * 60 * 1000);
    }

    #[test]
    fn finished_timer_yields_record() {
        let mut timer = FocusTimer::new(25).with_task("t-1");
        assert!(timer.to_record().is_none());
        timer.start(t0());
        timer.pause(mins(10));
        assert!(timer.to_record().is_none());
        timer.stop(mins(12));

        let record = timer.to_record().unwrap();
        assert_eq!(record.task_id.as_deref(), Some("t-1"));
        assert_eq!(record.started_at, t0());
        assert_eq!(record.duration_minutes, 10);
        assert_eq!(record.ended_at, Some(mins(12)));
    }

    #[test]
    fn reset_restores_full_duration() {
        let mut timer = FocusTimer::new(5);
        timer.start(t0());
        timer.stop(mins(2));
        timer.reset(mins(3));
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining_ms(), 5 * 60 * 1000);
        assert!(timer.start(mins(4)).is_some());
    }

    #[test]
    fn snapshot_reports_progress() {
        let mut timer = FocusTimer::new(10);
        timer.start(t0());
        timer.tick(mins(5));
        match timer.snapshot(mins(5)) {
            Event::StateSnapshot {
                state,
                remaining_ms,
                progress_pct,
                ..
            } => {
                assert_eq!(state, TimerState::Running);
                assert_eq!(remaining_ms, 5 * 60 * 1000);
                assert_eq!(progress_pct, 50.0);
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }
}
