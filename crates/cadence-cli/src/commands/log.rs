use chrono::{Duration, NaiveDateTime};
use clap::Subcommand;
use cadence_core::{CompletionRecord, EnergyEntry, EnergyLevel, FocusSessionRecord, Mood, MoodEntry};

use super::{parse_energy, parse_mood, CliResult, Context};

#[derive(Subcommand)]
pub enum LogAction {
    /// Record a completed task
    Completion {
        /// Task ID
        #[arg(long)]
        task_id: String,
        /// Task title
        #[arg(long, default_value = "")]
        title: String,
        /// Energy the task required (low, medium, high)
        #[arg(long, value_parser = parse_energy, default_value = "medium")]
        energy: EnergyLevel,
        /// Mood at completion
        #[arg(long, value_parser = parse_mood)]
        mood: Option<Mood>,
    },
    /// Record an energy self-report (1-10, clamped)
    Energy {
        #[arg(allow_negative_numbers = true)]
        level: i64,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Record a mood self-report (low, neutral, high)
    Mood {
        #[arg(value_parser = parse_mood)]
        mood: Mood,
        /// Energy felt alongside the mood
        #[arg(long, value_parser = parse_energy)]
        energy: Option<EnergyLevel>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Record a finished focus session
    Focus {
        /// Session length in minutes
        #[arg(long, allow_negative_numbers = true)]
        minutes: i64,
        /// Task ID worked on
        #[arg(long)]
        task_id: Option<String>,
        /// Session start (defaults to now minus the session length)
        #[arg(long)]
        started_at: Option<NaiveDateTime>,
    },
}

pub fn run(ctx: &Context, action: LogAction) -> CliResult {
    let now = ctx.now;
    match action {
        LogAction::Completion {
            task_id,
            title,
            energy,
            mood,
        } => {
            let mut record = CompletionRecord::new(task_id, title, energy, now);
            record.mood = mood;
            ctx.history.append_completion(&record)?;
            ctx.output(&record, |r| println!("logged completion {}", r.id))
        }
        LogAction::Energy { level, notes } => {
            let mut entry = EnergyEntry::new(level, now);
            entry.notes = notes;
            ctx.history.append_energy(&entry)?;
            ctx.output(&entry, |e| println!("logged energy {}/10 ({})", e.level, e.band().name()))
        }
        LogAction::Mood {
            mood,
            energy,
            notes,
        } => {
            let mut entry = MoodEntry::new(mood, now);
            entry.energy = energy;
            entry.notes = notes;
            ctx.history.append_mood(&entry)?;
            ctx.output(&entry, |e| println!("logged mood {}", e.mood.name()))
        }
        LogAction::Focus {
            minutes,
            task_id,
            started_at,
        } => {
            let started_at = started_at.unwrap_or(now - Duration::minutes(minutes.max(0)));
            let record = FocusSessionRecord::new(task_id, started_at, minutes)?;
            ctx.history.append_focus_session(&record)?;
            ctx.output(&record, |r| {
                println!(
                    "logged {} min focus session starting {}",
                    r.duration_minutes,
                    r.started_at.format("%Y-%m-%d %H:%M")
                )
            })
        }
    }
}
