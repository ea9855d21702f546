use std::error::Error;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod sink;

use commands::Context;

#[derive(Parser)]
#[command(name = "cadence-cli", version, about = "Cadence CLI")]
struct Cli {
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Evaluate as if the local time were this (e.g. 2024-06-18T10:00:00)
    #[arg(long, global = true)]
    at: Option<NaiveDateTime>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record history
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Productivity patterns, correlations and insights
    Patterns,
    /// Rank open tasks for right now
    Suggest(commands::suggest::SuggestArgs),
    /// Proactive check-ins
    Checkin {
        #[command(subcommand)]
        action: commands::checkin::CheckInAction,
    },
    /// Scheduled nudges
    Nudges {
        #[command(subcommand)]
        action: commands::nudges::NudgesAction,
    },
    /// Throttled smart notifications
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

async fn run(command: Commands, now: NaiveDateTime, json: bool) -> Result<(), Box<dyn Error>> {
    let ctx = Context::open(now, json)?;
    tracing::debug!(%now, "evaluating command");
    match command {
        Commands::Log { action } => commands::log::run(&ctx, action),
        Commands::Patterns => commands::patterns::run(&ctx).await,
        Commands::Suggest(args) => commands::suggest::run(&ctx, args).await,
        Commands::Checkin { action } => commands::checkin::run(&ctx, action).await,
        Commands::Nudges { action } => commands::nudges::run(&ctx, action).await,
        Commands::Notify { action } => commands::notify::run(&ctx, action).await,
        Commands::Config { action } => commands::config::run(&ctx, action),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CADENCE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let now = cli
        .at
        .unwrap_or_else(|| chrono::Local::now().naive_local());

    let result = run(cli.command, now, cli.json).await;

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
