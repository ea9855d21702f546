pub mod checkin;
pub mod config;
pub mod log;
pub mod notify;
pub mod nudges;
pub mod patterns;
pub mod suggest;

use std::error::Error;
use std::sync::Arc;

use cadence_core::{CadenceEngine, Config, EnergyLevel, EngineDb, HistoryDb, Mood, NudgeType};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::sink::ConsoleSink;

pub type CliResult = Result<(), Box<dyn Error>>;

/// Everything a command needs: the engine over the local database, plus
/// the evaluation time and output mode.
pub struct Context {
    pub now: NaiveDateTime,
    pub json: bool,
    pub history: Arc<HistoryDb>,
    pub engine: CadenceEngine,
}

impl Context {
    pub fn open(now: NaiveDateTime, json: bool) -> Result<Self, Box<dyn Error>> {
        let config = Config::load()?;
        let history = Arc::new(HistoryDb::open()?);
        let schedules = Arc::new(EngineDb::open()?);
        let engine = CadenceEngine::new(config, history.clone(), schedules, Arc::new(ConsoleSink));
        Ok(Self {
            now,
            json,
            history,
            engine,
        })
    }

    /// Print `value` as pretty JSON, or hand it to `text` for human output.
    pub fn output<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> CliResult {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }
}

pub fn parse_energy(s: &str) -> Result<EnergyLevel, String> {
    EnergyLevel::parse(s).ok_or_else(|| format!("expected low, medium or high, got '{s}'"))
}

pub fn parse_mood(s: &str) -> Result<Mood, String> {
    Mood::parse(s).ok_or_else(|| format!("expected low, neutral or high, got '{s}'"))
}

pub fn parse_nudge_type(s: &str) -> Result<NudgeType, String> {
    NudgeType::parse(s).ok_or_else(|| {
        format!(
            "expected focus_reminder, energy_check, task_suggestion, check_in or encouragement, got '{s}'"
        )
    })
}

pub fn day_name(day: u8) -> &'static str {
    match day {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "?",
    }
}
