//! SQLite persistence for engine-produced state.
//!
//! Scheduled nudges, the notification audit trail and proactive check-ins,
//! each keyed by id and scoped to a user.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{data_dir, format_ts, open_connection, open_memory_connection, parse_ts, DB_FILE};
use crate::checkin::{CheckInType, ProactiveCheckIn};
use crate::error::{DatabaseError, Result};
use crate::history::{EnergyLevel, Mood};
use crate::nudge::{NotificationHistoryEntry, NudgeTime, NudgeType, ScheduledNudge};

/// Persistence contract for schedules, audit entries and check-ins.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Insert or replace by id.
    async fn save_nudge(&self, user_id: &str, nudge: &ScheduledNudge) -> Result<()>;

    /// Ordered by time of day.
    async fn list_nudges(&self, user_id: &str) -> Result<Vec<ScheduledNudge>>;

    async fn get_nudge(&self, user_id: &str, id: &str) -> Result<Option<ScheduledNudge>>;

    /// `false` if no such nudge.
    async fn set_nudge_enabled(&self, user_id: &str, id: &str, enabled: bool) -> Result<bool>;

    async fn delete_nudge(&self, user_id: &str, id: &str) -> Result<bool>;

    /// Atomically swap the user's whole nudge set.
    async fn replace_nudges(&self, user_id: &str, nudges: &[ScheduledNudge]) -> Result<()>;

    async fn append_notification(&self, user_id: &str, entry: &NotificationHistoryEntry)
        -> Result<()>;

    /// Update acknowledgement, dismissal and action flags.
    async fn update_notification(
        &self,
        user_id: &str,
        entry: &NotificationHistoryEntry,
    ) -> Result<bool>;

    /// Entries sent at or after `since`, oldest first.
    async fn notifications_since(
        &self,
        user_id: &str,
        since: NaiveDateTime,
    ) -> Result<Vec<NotificationHistoryEntry>>;

    /// Insert or replace by id.
    async fn save_check_in(&self, user_id: &str, check_in: &ProactiveCheckIn) -> Result<()>;

    async fn get_check_in(&self, user_id: &str, id: &str) -> Result<Option<ProactiveCheckIn>>;

    /// Check-ins scheduled at or after `since`, oldest first.
    async fn check_ins_since(
        &self,
        user_id: &str,
        since: NaiveDateTime,
    ) -> Result<Vec<ProactiveCheckIn>>;
}

/// SQLite database for nudges, notification history and check-ins.
pub struct EngineDb {
    conn: Mutex<Connection>,
}

impl EngineDb {
    /// Open the database at `<data_dir>/cadence.db`.
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

    pub fn open_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(open_memory_connection()?),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DatabaseError::Poisoned.into())
    }
}

// ── Row mapping ──────────────────────────────────────────────────────

const NUDGE_COLUMNS: &str = "id, scheduled_time, nudge_type, message, enabled, repeat_days";
const NOTIFICATION_COLUMNS: &str =
    "id, nudge_type, sent_at, acknowledged_at, dismissed, action_taken, deliver_at";
const CHECK_IN_COLUMNS: &str = "id, check_in_type, message, scheduled_time, delivered, \
     responded, response, energy, mood, responded_at";

struct NudgeRow {
    id: String,
    scheduled_time: String,
    nudge_type: String,
    message: String,
    enabled: bool,
    repeat_days: String,
}

impl NudgeRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            scheduled_time: row.get(1)?,
            nudge_type: row.get(2)?,
            message: row.get(3)?,
            enabled: row.get(4)?,
            repeat_days: row.get(5)?,
        })
    }

    fn into_nudge(self) -> Option<ScheduledNudge> {
        let parsed = (
            self.scheduled_time.parse::<NudgeTime>().ok(),
            NudgeType::parse(&self.nudge_type),
            serde_json::from_str::<BTreeSet<u8>>(&self.repeat_days).ok(),
        );
        let (Some(scheduled_time), Some(nudge_type), Some(repeat_days)) = parsed else {
            tracing::warn!(id = %self.id, nudge_type = %self.nudge_type, "skipping unreadable nudge row");
            return None;
        };
        Some(ScheduledNudge {
            id: self.id,
            scheduled_time,
            nudge_type,
            message: self.message,
            enabled: self.enabled,
            repeat_days,
        })
    }
}

fn read_notification(row: &Row<'_>) -> rusqlite::Result<Option<NotificationHistoryEntry>> {
    let id: String = row.get(0)?;
    let nudge_type: String = row.get(1)?;
    let sent_at: String = row.get(2)?;
    let acknowledged_at: Option<String> = row.get(3)?;
    let deliver_at: Option<String> = row.get(6)?;

    let (Some(nudge_type), Some(sent_at)) = (NudgeType::parse(&nudge_type), parse_ts(&sent_at))
    else {
        tracing::warn!(%id, %nudge_type, "skipping unreadable notification row");
        return Ok(None);
    };
    Ok(Some(NotificationHistoryEntry {
        id,
        nudge_type,
        sent_at,
        // Rows written before v4 were delivered immediately
        deliver_at: deliver_at.as_deref().and_then(parse_ts).unwrap_or(sent_at),
        acknowledged_at: acknowledged_at.as_deref().and_then(parse_ts),
        dismissed: row.get(4)?,
        action_taken: row.get(5)?,
    }))
}

fn read_check_in(row: &Row<'_>) -> rusqlite::Result<Option<ProactiveCheckIn>> {
    let id: String = row.get(0)?;
    let check_in_type: String = row.get(1)?;
    let scheduled_time: String = row.get(3)?;
    let energy: String = row.get(7)?;
    let mood: String = row.get(8)?;
    let responded_at: Option<String> = row.get(9)?;

    let parsed = (
        CheckInType::parse(&check_in_type),
        parse_ts(&scheduled_time),
        EnergyLevel::parse(&energy),
        Mood::parse(&mood),
    );
    let (Some(check_in_type), Some(scheduled_time), Some(energy), Some(mood)) = parsed else {
        tracing::warn!(%id, %check_in_type, "skipping unreadable check-in row");
        return Ok(None);
    };
    Ok(Some(ProactiveCheckIn {
        id,
        check_in_type,
        message: row.get(2)?,
        scheduled_time,
        delivered: row.get(4)?,
        responded: row.get(5)?,
        response: row.get(6)?,
        responded_at: responded_at.as_deref().and_then(parse_ts),
        energy,
        mood,
    }))
}

fn insert_nudge(conn: &Connection, user_id: &str, nudge: &ScheduledNudge) -> Result<()> {
    let repeat_days = serde_json::to_string(&nudge.repeat_days)?;
    conn.execute(
        "INSERT OR REPLACE INTO nudges
            (id, user_id, scheduled_time, nudge_type, message, enabled, repeat_days)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            nudge.id,
            user_id,
            nudge.scheduled_time.to_string(),
            nudge.nudge_type.as_str(),
            nudge.message,
            nudge.enabled,
            repeat_days,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl ScheduleStore for EngineDb {
    async fn save_nudge(&self, user_id: &str, nudge: &ScheduledNudge) -> Result<()> {
        let conn = self.conn()?;
        insert_nudge(&conn, user_id, nudge)
    }

    async fn list_nudges(&self, user_id: &str) -> Result<Vec<ScheduledNudge>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {NUDGE_COLUMNS} FROM nudges WHERE user_id = ?1 ORDER BY scheduled_time, id"
        ))?;
        let rows = stmt.query_map([user_id], NudgeRow::read)?;
        let mut out = Vec::new();
        for row in rows {
            if let Some(nudge) = row?.into_nudge() {
                out.push(nudge);
            }
        }
        Ok(out)
    }

    async fn get_nudge(&self, user_id: &str, id: &str) -> Result<Option<ScheduledNudge>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {NUDGE_COLUMNS} FROM nudges WHERE user_id = ?1 AND id = ?2"),
                [user_id, id],
                NudgeRow::read,
            )
            .optional()?;
        Ok(row.and_then(NudgeRow::into_nudge))
    }

    async fn set_nudge_enabled(&self, user_id: &str, id: &str, enabled: bool) -> Result<bool> {
        let changed = self.conn()?.execute(
            "UPDATE nudges SET enabled = ?1 WHERE user_id = ?2 AND id = ?3",
            params![enabled, user_id, id],
        )?;
        Ok(changed > 0)
    }

    async fn delete_nudge(&self, user_id: &str, id: &str) -> Result<bool> {
        let changed = self.conn()?.execute(
            "DELETE FROM nudges WHERE user_id = ?1 AND id = ?2",
            [user_id, id],
        )?;
        Ok(changed > 0)
    }

    async fn replace_nudges(&self, user_id: &str, nudges: &[ScheduledNudge]) -> Result<()> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM nudges WHERE user_id = ?1", [user_id])?;
        for nudge in nudges {
            insert_nudge(&tx, user_id, nudge)?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn append_notification(
        &self,
        user_id: &str,
        entry: &NotificationHistoryEntry,
    ) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO notification_history
                (id, user_id, nudge_type, sent_at, deliver_at,
                 acknowledged_at, dismissed, action_taken)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.id,
                user_id,
                entry.nudge_type.as_str(),
                format_ts(entry.sent_at),
                format_ts(entry.deliver_at),
                entry.acknowledged_at.map(format_ts),
                entry.dismissed,
                entry.action_taken,
            ],
        )?;
        Ok(())
    }

    async fn update_notification(
        &self,
        user_id: &str,
        entry: &NotificationHistoryEntry,
    ) -> Result<bool> {
        let changed = self.conn()?.execute(
            "UPDATE notification_history
             SET acknowledged_at = ?1, dismissed = ?2, action_taken = ?3
             WHERE user_id = ?4 AND id = ?5",
            params![
                entry.acknowledged_at.map(format_ts),
                entry.dismissed,
                entry.action_taken,
                user_id,
                entry.id,
            ],
        )?;
        Ok(changed > 0)
    }

    async fn notifications_since(
        &self,
        user_id: &str,
        since: NaiveDateTime,
    ) -> Result<Vec<NotificationHistoryEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notification_history
             WHERE user_id = ?1 AND sent_at >= ?2
             ORDER BY sent_at ASC"
        ))?;
        let rows = stmt.query_map(params![user_id, format_ts(since)], read_notification)?;
        let mut out = Vec::new();
        for row in rows {
            out.extend(row?);
        }
        Ok(out)
    }

    async fn save_check_in(&self, user_id: &str, check_in: &ProactiveCheckIn) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO check_ins
                (id, user_id, check_in_type, message, scheduled_time,
                 delivered, responded, response, responded_at, energy, mood)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                check_in.id,
                user_id,
                check_in.check_in_type.as_str(),
                check_in.message,
                format_ts(check_in.scheduled_time),
                check_in.delivered,
                check_in.responded,
                check_in.response,
                check_in.responded_at.map(format_ts),
                check_in.energy.name(),
                check_in.mood.name(),
            ],
        )?;
        Ok(())
    }

    async fn get_check_in(&self, user_id: &str, id: &str) -> Result<Option<ProactiveCheckIn>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {CHECK_IN_COLUMNS} FROM check_ins WHERE user_id = ?1 AND id = ?2"),
                [user_id, id],
                read_check_in,
            )
            .optional()?;
        Ok(row.flatten())
    }

    async fn check_ins_since(
        &self,
        user_id: &str,
        since: NaiveDateTime,
    ) -> Result<Vec<ProactiveCheckIn>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHECK_IN_COLUMNS} FROM check_ins
             WHERE user_id = ?1 AND scheduled_time >= ?2
             ORDER BY scheduled_time ASC"
        ))?;
        let rows = stmt.query_map(params![user_id, format_ts(since)], read_check_in)?;
        let mut out = Vec::new();
        for row in rows {
            out.extend(row?);
        }
        Ok(out)
    }
}
