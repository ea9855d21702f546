//! Notification delivery port.

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::nudge::{NudgeType, ScheduledNudge};

/// One delivery request, either a recurring nudge or a one-off send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub nudge_type: NudgeType,
    pub title: String,
    pub body: String,
    /// First delivery
    pub at: NaiveDateTime,
    /// Empty for one-off notifications
    #[serde(default)]
    pub repeat_days: BTreeSet<u8>,
}

impl NotificationRequest {
    pub fn one_off(nudge_type: NudgeType, body: impl Into<String>, at: NaiveDateTime) -> Self {
        Self {
            nudge_type,
            title: title_for(nudge_type).to_string(),
            body: body.into(),
            at,
            repeat_days: BTreeSet::new(),
        }
    }

    /// Recurring request for `nudge`, first firing on `date_of`'s day.
    pub fn for_nudge(nudge: &ScheduledNudge, date_of: NaiveDateTime) -> Self {
        let at = date_of
            .date()
            .and_hms_opt(
                u32::from(nudge.scheduled_time.hour()),
                u32::from(nudge.scheduled_time.minute()),
                0,
            )
            .unwrap_or(date_of);
        Self {
            nudge_type: nudge.nudge_type,
            title: title_for(nudge.nudge_type).to_string(),
            body: nudge.message.clone(),
            at,
            repeat_days: nudge.repeat_days.clone(),
        }
    }
}

fn title_for(nudge_type: NudgeType) -> &'static str {
    match nudge_type {
        NudgeType::FocusReminder => "Time to focus",
        NudgeType::EnergyCheck => "Energy check",
        NudgeType::TaskSuggestion => "Suggested next task",
        NudgeType::CheckIn => "Checking in",
        NudgeType::Encouragement => "Keep going",
    }
}

/// Platform notification delivery.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Returns the platform id, or `None` when delivery was declined
    /// (e.g. notifications disabled at the OS level).
    async fn schedule(&self, request: &NotificationRequest) -> Result<Option<String>>;

    /// `true` if something was cancelled.
    async fn cancel(&self, id: &str) -> Result<bool>;

    async fn cancel_all(&self) -> Result<()>;
}

/// In-memory sink that accepts everything.
#[derive(Debug, Default)]
pub struct MemorySink {
    scheduled: Mutex<Vec<(String, NotificationRequest)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> Vec<(String, NotificationRequest)> {
        self.scheduled
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<(String, NotificationRequest)>>> {
        self.scheduled
            .lock()
            .map_err(|_| CoreError::Sink("memory sink lock poisoned".to_string()))
    }
}

#[async_trait]
impl NotificationSink for MemorySink {
    async fn schedule(&self, request: &NotificationRequest) -> Result<Option<String>> {
        let id = Uuid::new_v4().to_string();
        self.lock()?.push((id.clone(), request.clone()));
        Ok(Some(id))
    }

    async fn cancel(&self, id: &str) -> Result<bool> {
        let mut scheduled = self.lock()?;
        let before = scheduled.len();
        scheduled.retain(|(existing, _)| existing != id);
        Ok(scheduled.len() != before)
    }

    async fn cancel_all(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}
