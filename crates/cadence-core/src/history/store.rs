//! History read contract and snapshots.

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::records::{CompletionRecord, EnergyEntry, FocusSessionRecord, MoodEntry};
use crate::error::Result;

/// Inclusive timestamp bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// The `days` leading up to and including `now`.
    pub fn trailing_days(now: NaiveDateTime, days: i64) -> Self {
        Self {
            start: now - Duration::days(days),
            end: now,
        }
    }

    /// An inverted range is empty, not an error.
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Read side of the user's history.
///
/// Implementations return time-ordered records; an empty range yields an
/// empty vector.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn get_completions(&self, range: TimeRange) -> Result<Vec<CompletionRecord>>;

    async fn get_energy_logs(&self, range: TimeRange) -> Result<Vec<EnergyEntry>>;

    async fn get_mood_entries(&self, range: TimeRange) -> Result<Vec<MoodEntry>>;

    async fn get_focus_sessions(&self, range: TimeRange) -> Result<Vec<FocusSessionRecord>>;
}

/// Point-in-time copy of history that every analysis runs against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub completions: Vec<CompletionRecord>,
    pub energy_logs: Vec<EnergyEntry>,
    pub mood_entries: Vec<MoodEntry>,
    pub focus_sessions: Vec<FocusSessionRecord>,
}

impl HistorySnapshot {
    /// Read all four record kinds for `range`.
    pub async fn load(store: &dyn HistoryStore, range: TimeRange) -> Result<Self> {
        Ok(Self {
            completions: store.get_completions(range).await?,
            energy_logs: store.get_energy_logs(range).await?,
            mood_entries: store.get_mood_entries(range).await?,
            focus_sessions: store.get_focus_sessions(range).await?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.completions.is_empty()
            && self.energy_logs.is_empty()
            && self.mood_entries.is_empty()
            && self.focus_sessions.is_empty()
    }

    /// Most recent recorded activity of any kind.
    pub fn last_activity(&self) -> Option<NaiveDateTime> {
        let completions = self.completions.iter().map(|c| c.completed_at);
        let energy = self.energy_logs.iter().map(|e| e.timestamp);
        let moods = self.mood_entries.iter().map(|m| m.timestamp);
        let focus = self
            .focus_sessions
            .iter()
            .map(|f| f.ended_at.unwrap_or(f.started_at));
        completions.chain(energy).chain(moods).chain(focus).max()
    }

    /// Latest mood entry, if any.
    pub fn latest_mood(&self) -> Option<&MoodEntry> {
        self.mood_entries.iter().max_by_key(|m| m.timestamp)
    }

    /// Latest energy entry, if any.
    pub fn latest_energy(&self) -> Option<&EnergyEntry> {
        self.energy_logs.iter().max_by_key(|e| e.timestamp)
    }
}

/// In-memory history, kept sorted by timestamp.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    snapshot: HistorySnapshot,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(mut snapshot: HistorySnapshot) -> Self {
        snapshot.completions.sort_by_key(|c| c.completed_at);
        snapshot.energy_logs.sort_by_key(|e| e.timestamp);
        snapshot.mood_entries.sort_by_key(|m| m.timestamp);
        snapshot.focus_sessions.sort_by_key(|f| f.started_at);
        Self { snapshot }
    }

    pub fn push_completion(&mut self, record: CompletionRecord) {
        let at = self
            .snapshot
            .completions
            .partition_point(|c| c.completed_at <= record.completed_at);
        self.snapshot.completions.insert(at, record);
    }

    pub fn push_energy(&mut self, entry: EnergyEntry) {
        let at = self
            .snapshot
            .energy_logs
            .partition_point(|e| e.timestamp <= entry.timestamp);
        self.snapshot.energy_logs.insert(at, entry);
    }

    pub fn push_mood(&mut self, entry: MoodEntry) {
        let at = self
            .snapshot
            .mood_entries
            .partition_point(|m| m.timestamp <= entry.timestamp);
        self.snapshot.mood_entries.insert(at, entry);
    }

    pub fn push_focus_session(&mut self, record: FocusSessionRecord) {
        let at = self
            .snapshot
            .focus_sessions
            .partition_point(|f| f.started_at <= record.started_at);
        self.snapshot.focus_sessions.insert(at, record);
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn get_completions(&self, range: TimeRange) -> Result<Vec<CompletionRecord>> {
        Ok(self
            .snapshot
            .completions
            .iter()
            .filter(|c| range.contains(c.completed_at))
            .cloned()
            .collect())
    }

    async fn get_energy_logs(&self, range: TimeRange) -> Result<Vec<EnergyEntry>> {
        Ok(self
            .snapshot
            .energy_logs
            .iter()
            .filter(|e| range.contains(e.timestamp))
            .cloned()
            .collect())
    }

    async fn get_mood_entries(&self, range: TimeRange) -> Result<Vec<MoodEntry>> {
        Ok(self
            .snapshot
            .mood_entries
            .iter()
            .filter(|m| range.contains(m.timestamp))
            .cloned()
            .collect())
    }

    async fn get_focus_sessions(&self, range: TimeRange) -> Result<Vec<FocusSessionRecord>> {
        Ok(self
            .snapshot
            .focus_sessions
            .iter()
            .filter(|f| range.contains(f.started_at))
            .cloned()
            .collect())
    }
}
