use cadence_core::checkin::CheckInTypeStats;
use cadence_core::{EnergyLevel, Mood, ProactiveCheckIn};
use clap::Subcommand;
use serde::Serialize;

use super::{parse_energy, parse_mood, CliResult, Context};

#[derive(Subcommand)]
pub enum CheckInAction {
    /// Issue a check-in if one is due now
    Evaluate {
        /// Current energy (defaults to the latest report)
        #[arg(long, value_parser = parse_energy)]
        energy: Option<EnergyLevel>,
        /// Current mood (defaults to the latest report)
        #[arg(long, value_parser = parse_mood)]
        mood: Option<Mood>,
    },
    /// Answer a check-in
    Respond {
        /// Check-in ID
        id: String,
        /// Free-form answer
        response: String,
    },
    /// Recent check-ins with response rates
    List {
        /// How many days back
        #[arg(long, default_value = "7")]
        days: i64,
    },
}

#[derive(Serialize)]
struct CheckInList {
    check_ins: Vec<ProactiveCheckIn>,
    stats: Vec<CheckInTypeStats>,
}

pub async fn run(ctx: &Context, action: CheckInAction) -> CliResult {
    match action {
        CheckInAction::Evaluate { energy, mood } => {
            let snapshot = ctx.engine.load_snapshot(ctx.now).await?;
            let mut signals = ctx.engine.live_signals(&snapshot, Vec::new());
            if let Some(energy) = energy {
                signals.energy = energy;
            }
            if let Some(mood) = mood {
                signals.mood = mood;
            }
            let check_in = ctx.engine.evaluate_check_in(ctx.now, Some(&signals)).await;
            ctx.output(&check_in, |c| match c {
                Some(c) => println!("{} [{}] {}", c.id, c.check_in_type.as_str(), c.message),
                None => println!("no check-in due"),
            })
        }
        CheckInAction::Respond { id, response } => {
            let check_in = ctx
                .engine
                .respond_to_check_in(&id, &response, ctx.now)
                .await
                .ok_or_else(|| format!("no open check-in with id {id}"))?;
            ctx.output(&check_in, |c| println!("recorded response to {}", c.id))
        }
        CheckInAction::List { days } => {
            let check_ins = ctx.engine.check_in_history(ctx.now, days).await;
            let stats = ctx.engine.check_in_stats(&check_ins);
            let cooldown = ctx.engine.config().checkins.scheduler_config().cooldown();
            let now = ctx.now;
            ctx.output(&CheckInList { check_ins, stats }, |list| {
                for c in &list.check_ins {
                    println!(
                        "{}  {}  {:<16} {:?}  {}",
                        c.id,
                        c.scheduled_time.format("%Y-%m-%d %H:%M"),
                        c.check_in_type.as_str(),
                        c.state(now, cooldown),
                        c.response.as_deref().unwrap_or("")
                    );
                }
                for s in &list.stats {
                    println!(
                        "{}: {}/{} answered ({:.0}%)",
                        s.check_in_type.as_str(),
                        s.responded,
                        s.total,
                        s.response_rate * 100.0
                    );
                }
            })
        }
    }
}
