//! Async countdown driver for [`FocusTimer`].

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::watch;

use super::engine::{FocusTimer, TimerState};
use crate::events::Event;

/// Cloneable cancel signal shared between a countdown and its owner.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once `cancel` has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                // Sender lives as long as any token clone, so this is unreachable
                // while `self` exists.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    Completed,
    Cancelled,
}

/// Tick `timer` every `period` until it completes or `token` is cancelled.
///
/// An idle timer is started first. Cancellation stops the timer, so the
/// caller can still turn it into a history record.
pub async fn run_countdown<C, F>(
    timer: &mut FocusTimer,
    period: Duration,
    clock: C,
    token: CancellationToken,
    mut on_event: F,
) -> CountdownOutcome
where
    C: Fn() -> NaiveDateTime,
    F: FnMut(&Event),
{
    if let Some(event) = timer.start(clock()) {
        on_event(&event);
    }

    let mut interval = tokio::time::interval(period);
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                if let Some(event) = timer.stop(clock()) {
                    on_event(&event);
                }
                tracing::debug!(remaining_ms = timer.remaining_ms(), "countdown cancelled");
                return CountdownOutcome::Cancelled;
            }
            _ = interval.tick() => {
                if let Some(event) = timer.tick(clock()) {
                    on_event(&event);
                }
                match timer.state() {
                    TimerState::Completed => return CountdownOutcome::Completed,
                    TimerState::Stopped => return CountdownOutcome::Cancelled,
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::cell::Cell;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 18)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn countdown_runs_to_completion() {
        // Every clock read advances one minute.
        let reads = Cell::new(0i64);
        let clock = || {
            let n = reads.get();
            reads.set(n + 1);
            t0() + chrono::Duration::minutes(n)
        };

        let mut timer = FocusTimer::new(3);
        let mut events = Vec::new();
        let outcome = run_countdown(
            &mut timer,
            Duration::from_millis(1),
            clock,
            CancellationToken::new(),
            |e| events.push(e.clone()),
        )
        .await;

        assert_eq!(outcome, CountdownOutcome::Completed);
        assert_eq!(timer.state(), TimerState::Completed);
        assert!(matches!(events.first(), Some(Event::TimerStarted { .. })));
        assert_eq!(
            events.iter().filter(|e| matches!(e, Event::TimerCompleted { .. })).count(),
            1
        );
        assert_eq!(timer.to_record().unwrap().duration_minutes, 3);
    }

    #[tokio::test]
    async fn cancellation_stops_the_timer() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());

        let mut timer = FocusTimer::new(25);
        let mut events = Vec::new();
        let outcome = run_countdown(
            &mut timer,
            Duration::from_millis(1),
            t0,
            token.clone(),
            |e| events.push(e.clone()),
        )
        .await;

        assert_eq!(outcome, CountdownOutcome::Cancelled);
        assert_eq!(timer.state(), TimerState::Stopped);
        assert!(matches!(events.last(), Some(Event::TimerStopped { .. })));
    }

    #[tokio::test]
    async fn cancel_from_another_task() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        token.cancel();
        handle.await.unwrap();
    }
}
