//! SQLite-backed history.
//!
//! Provides persistent storage for:
//! - Task completions
//! - Energy and mood self-reports
//! - Focus sessions
//!
//! Rows that no longer parse (unknown enum names, bad timestamps) are skipped
//! with a warning instead of failing the whole read.

use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{data_dir, format_ts, open_connection, open_memory_connection, parse_ts, DB_FILE};
use crate::error::{DatabaseError, Result};
use crate::history::{
    CompletionRecord, EnergyEntry, EnergyLevel, FocusSessionRecord, HistoryStore, Mood, MoodEntry,
    TimeRange,
};

/// SQLite database for user history.
pub struct HistoryDb {
    conn: Mutex<Connection>,
}

impl HistoryDb {
    /// Open the database at `<data_dir>/cadence.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join(DB_FILE))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(open_connection(path)?),
        })
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(open_memory_connection()?),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DatabaseError::Poisoned.into())
    }

    // ── Appends ──────────────────────────────────────────────────────

    pub fn append_completion(&self, record: &CompletionRecord) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO completions
                (id, task_id, task_title, energy_level, completed_at, completion_duration_ms, mood)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                record.task_id,
                record.task_title,
                record.energy_level.name(),
                format_ts(record.completed_at),
                record.completion_duration_ms.map(|ms| ms as i64),
                record.mood.map(Mood::name),
            ],
        )?;
        Ok(())
    }

    pub fn append_energy(&self, entry: &EnergyEntry) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO energy_logs (id, level, timestamp, notes, context)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.id,
                entry.level,
                format_ts(entry.timestamp),
                entry.notes,
                entry.context,
            ],
        )?;
        Ok(())
    }

    pub fn append_mood(&self, entry: &MoodEntry) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO mood_entries (id, mood, timestamp, energy, notes, context)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id,
                entry.mood.name(),
                format_ts(entry.timestamp),
                entry.energy.map(EnergyLevel::name),
                entry.notes,
                entry.context,
            ],
        )?;
        Ok(())
    }

    pub fn append_focus_session(&self, record: &FocusSessionRecord) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO focus_sessions (id, task_id, started_at, ended_at, duration_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.task_id,
                format_ts(record.started_at),
                record.ended_at.map(format_ts),
                record.duration_minutes,
            ],
        )?;
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn completions(&self, range: TimeRange) -> Result<Vec<CompletionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, task_id, task_title, energy_level, completed_at, completion_duration_ms, mood
             FROM completions
             WHERE completed_at >= ?1 AND completed_at <= ?2
             ORDER BY completed_at ASC",
        )?;
        let rows = stmt.query_map(
            params![format_ts(range.start), format_ts(range.end)],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<i64>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            },
        )?;

        let mut out = Vec::new();
        for row in rows {
            let (id, task_id, task_title, energy, completed_at, duration_ms, mood) = row?;
            let (Some(energy_level), Some(completed_at)) =
                (EnergyLevel::parse(&energy), parse_ts(&completed_at))
            else {
                tracing::warn!(%id, %energy, "skipping unreadable completion row");
                continue;
            };
            out.push(CompletionRecord {
                id,
                task_id,
                task_title,
                energy_level,
                completed_at,
                completion_duration_ms: duration_ms.and_then(|ms| u64::try_from(ms).ok()),
                mood: mood.as_deref().and_then(Mood::parse),
            });
        }
        Ok(out)
    }

    pub fn energy_logs(&self, range: TimeRange) -> Result<Vec<EnergyEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, level, timestamp, notes, context
             FROM energy_logs
             WHERE timestamp >= ?1 AND timestamp <= ?2
             ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map(
            params![format_ts(range.start), format_ts(range.end)],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        )?;

        let mut out = Vec::new();
        for row in rows {
            let (id, level, timestamp, notes, context) = row?;
            let Some(timestamp) = parse_ts(&timestamp) else {
                tracing::warn!(%id, "skipping energy row with bad timestamp");
                continue;
            };
            let mut entry = EnergyEntry::new(level, timestamp);
            entry.id = id;
            entry.notes = notes;
            entry.context = context;
            out.push(entry);
        }
        Ok(out)
    }

    pub fn mood_entries(&self, range: TimeRange) -> Result<Vec<MoodEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, mood, timestamp, energy, notes, context
             FROM mood_entries
             WHERE timestamp >= ?1 AND timestamp <= ?2
             ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map(
            params![format_ts(range.start), format_ts(range.end)],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            },
        )?;

        let mut out = Vec::new();
        for row in rows {
            let (id, mood, timestamp, energy, notes, context) = row?;
            let (Some(mood), Some(timestamp)) = (Mood::parse(&mood), parse_ts(&timestamp)) else {
                tracing::warn!(%id, %mood, "skipping unreadable mood row");
                continue;
            };
            out.push(MoodEntry {
                id,
                mood,
                timestamp,
                energy: energy.as_deref().and_then(EnergyLevel::parse),
                notes,
                context,
            });
        }
        Ok(out)
    }

    pub fn focus_sessions(&self, range: TimeRange) -> Result<Vec<FocusSessionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, task_id, started_at, ended_at, duration_minutes
             FROM focus_sessions
             WHERE started_at >= ?1 AND started_at <= ?2
             ORDER BY started_at ASC",
        )?;
        let rows = stmt.query_map(
            params![format_ts(range.start), format_ts(range.end)],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )?;

        let mut out = Vec::new();
        for row in rows {
            let (id, task_id, started_at, ended_at, duration_minutes) = row?;
            let Some(started_at) = parse_ts(&started_at) else {
                tracing::warn!(%id, "skipping focus session with bad timestamp");
                continue;
            };
            out.push(FocusSessionRecord {
                id,
                task_id,
                started_at,
                ended_at: ended_at.as_deref().and_then(parse_ts),
                duration_minutes,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl HistoryStore for HistoryDb {
    async fn get_completions(&self, range: TimeRange) -> Result<Vec<CompletionRecord>> {
        self.completions(range)
    }

    async fn get_energy_logs(&self, range: TimeRange) -> Result<Vec<EnergyEntry>> {
        self.energy_logs(range)
    }

    async fn get_mood_entries(&self, range: TimeRange) -> Result<Vec<MoodEntry>> {
        self.mood_entries(range)
    }

    async fn get_focus_sessions(&self, range: TimeRange) -> Result<Vec<FocusSessionRecord>> {
        self.focus_sessions(range)
    }
}
