use std::io::Read;

use cadence_core::{CandidateTask, EnergyLevel, Mood};
use clap::Args;

use super::{parse_energy, parse_mood, CliResult, Context};

#[derive(Args)]
pub struct SuggestArgs {
    /// Tasks as a JSON array, a path to a JSON file, or "-" for stdin
    #[arg(long)]
    tasks: String,
    /// Current energy (defaults to the latest report)
    #[arg(long, value_parser = parse_energy)]
    energy: Option<EnergyLevel>,
    /// Current mood (defaults to the latest report)
    #[arg(long, value_parser = parse_mood)]
    mood: Option<Mood>,
}

fn read_tasks(source: &str) -> Result<Vec<CandidateTask>, Box<dyn std::error::Error>> {
    let raw = if source.trim_start().starts_with('[') {
        source.to_string()
    } else if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(source)?
    };
    Ok(serde_json::from_str(&raw)?)
}

pub async fn run(ctx: &Context, args: SuggestArgs) -> CliResult {
    let tasks = read_tasks(&args.tasks)?;
    let snapshot = ctx.engine.load_snapshot(ctx.now).await?;
    let mut signals = ctx.engine.live_signals(&snapshot, Vec::new());
    if let Some(energy) = args.energy {
        signals.energy = energy;
    }
    if let Some(mood) = args.mood {
        signals.mood = mood;
    }

    let suggestions = ctx.engine.suggest(&snapshot, &tasks, &signals, ctx.now);
    ctx.output(&suggestions, |list| {
        if list.is_empty() {
            println!("no open tasks");
        }
        for (i, s) in list.iter().enumerate() {
            println!("{}. {} (score {:.0}) - {}", i + 1, s.task_title, s.score, s.reason_text);
        }
    })
}
