use cadence_core::ScheduledNudge;
use clap::{ArgAction, Subcommand};

use super::{day_name, CliResult, Context};

#[derive(Subcommand)]
pub enum NudgesAction {
    /// Show optimal time slots and the nudges they would produce
    Recommend,
    /// Replace current nudges with the recommended set
    Install,
    /// List scheduled nudges
    List,
    /// Enable or disable a nudge
    Toggle {
        /// Nudge ID
        id: String,
        /// true to enable, false to disable
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
    /// Delete a nudge
    Delete {
        /// Nudge ID
        id: String,
    },
    /// Engagement rates of sent notifications
    Effectiveness {
        /// How many days back
        #[arg(long, default_value = "30")]
        days: i64,
    },
}

fn print_nudges(nudges: &[ScheduledNudge]) {
    if nudges.is_empty() {
        println!("no nudges scheduled");
    }
    for n in nudges {
        let days: Vec<&str> = n.repeat_days.iter().map(|d| day_name(*d).get(..3).unwrap_or("?")).collect();
        println!(
            "{}  {}  {:<16} {:<8} {}  {}",
            n.id,
            n.scheduled_time,
            n.nudge_type.as_str(),
            if n.enabled { "on" } else { "off" },
            days.join(","),
            n.message
        );
    }
}

pub async fn run(ctx: &Context, action: NudgesAction) -> CliResult {
    match action {
        NudgesAction::Recommend => {
            let snapshot = ctx.engine.load_snapshot(ctx.now).await?;
            let recommendation = ctx.engine.recommend_nudges(&snapshot, ctx.now);
            ctx.output(&recommendation, |r| {
                for slot in &r.slots {
                    println!("{:02}:00  confidence {:>3}%  {}", slot.hour, slot.confidence, slot.reason);
                }
                println!();
                print_nudges(&r.nudges);
            })
        }
        NudgesAction::Install => {
            let nudges = ctx.engine.install_recommended_nudges(ctx.now).await;
            if nudges.is_empty() {
                return Err("failed to install recommended nudges".into());
            }
            ctx.output(&nudges, |n| print_nudges(n))
        }
        NudgesAction::List => {
            let nudges = ctx.engine.nudges().await?;
            ctx.output(&nudges, |n| print_nudges(n))
        }
        NudgesAction::Toggle { id, enabled } => {
            if !ctx.engine.set_nudge_enabled(&id, enabled).await {
                return Err(format!("no nudge with id {id}").into());
            }
            ctx.output(&serde_json::json!({ "id": id, "enabled": enabled }), |_| {
                println!("nudge {id} {}", if enabled { "enabled" } else { "disabled" })
            })
        }
        NudgesAction::Delete { id } => {
            if !ctx.engine.delete_nudge(&id).await {
                return Err(format!("no nudge with id {id}").into());
            }
            ctx.output(&serde_json::json!({ "id": id, "deleted": true }), |_| {
                println!("nudge {id} deleted")
            })
        }
        NudgesAction::Effectiveness { days } => {
            let report = ctx
                .engine
                .notification_effectiveness(ctx.now, days)
                .await
                .ok_or("notification history unavailable")?;
            ctx.output(&report, |r| {
                println!(
                    "sent {}  acknowledged {:.0}%  dismissed {:.0}%  acted {:.0}%",
                    r.overall.sent,
                    r.overall.acknowledgement_rate() * 100.0,
                    r.overall.dismissal_rate() * 100.0,
                    r.overall.action_rate() * 100.0
                );
                for t in &r.by_type {
                    println!(
                        "  {:<16} sent {:>3}  acted {:.0}%",
                        t.nudge_type.as_str(),
                        t.rates.sent,
                        t.rates.action_rate() * 100.0
                    );
                }
                if let Some(hour) = r.most_responsive_hour() {
                    println!("most responsive hour: {hour:02}:00");
                }
            })
        }
    }
}
