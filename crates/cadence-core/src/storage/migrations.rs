//! Database schema migrations for cadence.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const CURRENT_VERSION: i32 = 4;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }
    if current_version < 4 {
        migrate_v4(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 for a fresh database.
pub fn get_schema_version(conn: &Connection) -> SqliteResult<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get::<_, i32>(0),
    )
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: history tables.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS completions (
            id                     TEXT PRIMARY KEY,
            task_id                TEXT NOT NULL,
            task_title             TEXT NOT NULL DEFAULT '',
            energy_level           TEXT NOT NULL,
            completed_at           TEXT NOT NULL,
            completion_duration_ms INTEGER,
            mood                   TEXT
        );

        CREATE TABLE IF NOT EXISTS energy_logs (
            id        TEXT PRIMARY KEY,
            level     INTEGER NOT NULL,
            timestamp TEXT NOT NULL,
            notes     TEXT,
            context   TEXT
        );

        CREATE TABLE IF NOT EXISTS mood_entries (
            id        TEXT PRIMARY KEY,
            mood      TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            energy    TEXT,
            notes     TEXT,
            context   TEXT
        );

        CREATE TABLE IF NOT EXISTS focus_sessions (
            id               TEXT PRIMARY KEY,
            task_id          TEXT,
            started_at       TEXT NOT NULL,
            ended_at         TEXT,
            duration_minutes INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_completions_completed_at ON completions(completed_at);
        CREATE INDEX IF NOT EXISTS idx_energy_logs_timestamp ON energy_logs(timestamp);
        CREATE INDEX IF NOT EXISTS idx_mood_entries_timestamp ON mood_entries(timestamp);
        CREATE INDEX IF NOT EXISTS idx_focus_sessions_started_at ON focus_sessions(started_at);",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: nudge schedule and notification audit trail.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS nudges (
            id             TEXT PRIMARY KEY,
            user_id        TEXT NOT NULL,
            scheduled_time TEXT NOT NULL,
            nudge_type     TEXT NOT NULL,
            message        TEXT NOT NULL,
            enabled        INTEGER NOT NULL DEFAULT 1,
            repeat_days    TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS notification_history (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL,
            nudge_type      TEXT NOT NULL,
            sent_at         TEXT NOT NULL,
            acknowledged_at TEXT,
            dismissed       INTEGER NOT NULL DEFAULT 0,
            action_taken    INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_nudges_user ON nudges(user_id);
        CREATE INDEX IF NOT EXISTS idx_notification_history_user_sent
            ON notification_history(user_id, sent_at);",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}

/// Migration v3: proactive check-ins.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS check_ins (
            id             TEXT PRIMARY KEY,
            user_id        TEXT NOT NULL,
            check_in_type  TEXT NOT NULL,
            message        TEXT NOT NULL,
            scheduled_time TEXT NOT NULL,
            delivered      INTEGER NOT NULL DEFAULT 0,
            responded      INTEGER NOT NULL DEFAULT 0,
            response       TEXT,
            energy         TEXT NOT NULL,
            mood           TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_check_ins_user_time ON check_ins(user_id, scheduled_time);",
    )?;
    set_schema_version(&tx, 3)?;
    tx.commit()
}

/// Migration v4: delivery time of audited notifications and response time
/// of check-ins.
fn migrate_v4(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "ALTER TABLE notification_history ADD COLUMN deliver_at TEXT;
        ALTER TABLE check_ins ADD COLUMN responded_at TEXT;",
    )?;
    set_schema_version(&tx, 4)?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn partial_database_is_upgraded() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 1);

        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
        let check_ins: i64 = conn
            .query_row("SELECT COUNT(*) FROM check_ins", [], |r| r.get(0))
            .unwrap();
        assert_eq!(check_ins, 0);
    }

    #[test]
    fn v3_rows_survive_upgrade_with_empty_new_columns() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        migrate_v2(&conn).unwrap();
        migrate_v3(&conn).unwrap();
        conn.execute(
            "INSERT INTO notification_history (id, user_id, nudge_type, sent_at)
             VALUES ('n-1', 'u1', 'encouragement', '2024-06-18T10:00:00.000')",
            [],
        )
        .unwrap();

        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 4);
        let deliver_at: Option<String> = conn
            .query_row(
                "SELECT deliver_at FROM notification_history WHERE id = 'n-1'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert!(deliver_at.is_none());
        let responded: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM check_ins WHERE responded_at IS NOT NULL",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(responded, 0);
    }
}
