use cadence_core::nudge::ThrottleDecision;
use cadence_core::{Mood, NotificationFeedback, NudgeType};
use clap::{Subcommand, ValueEnum};

use super::{parse_mood, parse_nudge_type, CliResult, Context};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Ask the throttle whether a notification may fire now
    Check {
        /// Current mood (defaults to the latest report)
        #[arg(long, value_parser = parse_mood)]
        mood: Option<Mood>,
    },
    /// Send a throttled one-off notification
    Send {
        /// focus_reminder, energy_check, task_suggestion, check_in, encouragement
        #[arg(value_parser = parse_nudge_type)]
        nudge_type: NudgeType,
        /// Notification text
        body: String,
        #[arg(long, value_parser = parse_mood)]
        mood: Option<Mood>,
    },
    /// Record how a sent notification was received
    Feedback {
        /// Notification ID
        id: String,
        #[arg(value_enum)]
        kind: FeedbackKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FeedbackKind {
    Acknowledged,
    Dismissed,
    Acted,
}

impl From<FeedbackKind> for NotificationFeedback {
    fn from(kind: FeedbackKind) -> Self {
        match kind {
            FeedbackKind::Acknowledged => NotificationFeedback::Acknowledged,
            FeedbackKind::Dismissed => NotificationFeedback::Dismissed,
            FeedbackKind::Acted => NotificationFeedback::ActedOn,
        }
    }
}

fn print_decision(decision: &ThrottleDecision) {
    match decision {
        ThrottleDecision::Blocked { reason } => println!("blocked: {}", reason.describe()),
        ThrottleDecision::Allowed {
            style,
            delay_minutes,
            fire_at,
        } => println!(
            "allowed: fires at {} (+{delay_minutes} min, {} style)",
            fire_at.format("%H:%M"),
            style.as_str()
        ),
    }
}

pub async fn run(ctx: &Context, action: NotifyAction) -> CliResult {
    match action {
        NotifyAction::Check { mood } => {
            let decision = ctx
                .engine
                .check_notification(ctx.now, mood)
                .await
                .ok_or("notification history unavailable")?;
            ctx.output(&decision, print_decision)
        }
        NotifyAction::Send {
            nudge_type,
            body,
            mood,
        } => {
            let sent = ctx
                .engine
                .send_smart_notification(nudge_type, &body, ctx.now, mood)
                .await
                .ok_or("notification could not be delivered")?;
            ctx.output(&sent, |s| {
                print_decision(&s.decision);
                if let Some(entry) = &s.entry {
                    println!("id: {}", entry.id);
                }
            })
        }
        NotifyAction::Feedback { id, kind } => {
            if !ctx
                .engine
                .record_notification_feedback(&id, kind.into(), ctx.now)
                .await
            {
                return Err(format!("no notification with id {id}").into());
            }
            ctx.output(&serde_json::json!({ "id": id, "recorded": true }), |_| {
                println!("feedback recorded")
            })
        }
    }
}
