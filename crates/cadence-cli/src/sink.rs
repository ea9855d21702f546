use async_trait::async_trait;
use cadence_core::{NotificationRequest, NotificationSink};
use uuid::Uuid;

/// Delivers notifications by printing them to stderr.
///
/// Nothing is retained, so there is nothing to cancel.
pub struct ConsoleSink;

#[async_trait]
impl NotificationSink for ConsoleSink {
    async fn schedule(&self, request: &NotificationRequest) -> cadence_core::Result<Option<String>> {
        let repeat = if request.repeat_days.is_empty() {
            String::new()
        } else {
            let days: Vec<String> = request.repeat_days.iter().map(u8::to_string).collect();
            format!(" (repeats on days {})", days.join(","))
        };
        eprintln!(
            "[{}] {} @ {}{repeat}",
            request.title,
            request.body,
            request.at.format("%Y-%m-%d %H:%M"),
        );
        Ok(Some(Uuid::new_v4().to_string()))
    }

    async fn cancel(&self, _id: &str) -> cadence_core::Result<bool> {
        Ok(false)
    }

    async fn cancel_all(&self) -> cadence_core::Result<()> {
        Ok(())
    }
}
