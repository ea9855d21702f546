mod config;
pub mod engine_db;
pub mod history_db;
pub mod migrations;

pub use config::{
    AnalysisConfig, CheckInsConfig, Config, NotificationsConfig, NudgesConfig, SuggestionsConfig,
};
pub use engine_db::{EngineDb, ScheduleStore};
pub use history_db::HistoryDb;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, DatabaseError, Result};

/// File name of the SQLite database inside the data directory.
pub const DB_FILE: &str = "cadence.db";

const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Returns `~/.config/cadence[-dev]/` based on CADENCE_ENV.
///
/// Set CADENCE_ENV=dev to use the development data directory, or
/// CADENCE_DATA_DIR to use an explicit directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("CADENCE_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("CADENCE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("cadence-dev")
            } else {
                base_dir.join("cadence")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Open (or create) and migrate the database at `path`.
pub(crate) fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
    migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
    Ok(conn)
}

pub(crate) fn open_memory_connection() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
    Ok(conn)
}

/// Fixed-width timestamp text; sorts the same way as the timestamps.
pub(crate) fn format_ts(ts: NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

pub(crate) fn parse_ts(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}
