//! Engine facade.
//!
//! [`CadenceEngine`] wires the pure analysis components to the three I/O
//! ports: history reads, schedule persistence and notification delivery.
//! Analysis stays synchronous over a [`HistorySnapshot`]; only the port
//! calls are awaited. Port failures are logged and surface as `None`/`false`
//! or an empty list.

use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDateTime};
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::checkin::{CheckInProfile, CheckInScheduler, CheckInTypeStats, ProactiveCheckIn};
use crate::history::{EnergyLevel, HistorySnapshot, HistoryStore, Mood, TimeRange};
use crate::notify::{NotificationRequest, NotificationSink};
use crate::nudge::{
    BlockReason, NotificationHistoryEntry, NotificationThrottle, NudgeEffectiveness,
    NudgeTimeOptimizer, NudgeType, OptimalTimeSlot, ScheduledNudge, ThrottleDecision,
};
use crate::patterns::{CorrelationEngine, CorrelationReport, PatternAnalyzer, PatternData};
use crate::storage::{Config, ScheduleStore};
use crate::suggestion::{
    CalendarEvent, CandidateTask, ContextBuilder, LiveSignals, SuggestionContext,
    SuggestionScorer, TaskSuggestion,
};

/// How far back check-in history is read for cooldown and listing.
const CHECK_IN_LOOKBACK_DAYS: i64 = 7;
const NOTIFICATION_LOOKBACK_DAYS: i64 = 30;

/// User reaction to a sent notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationFeedback {
    Acknowledged,
    Dismissed,
    ActedOn,
}

/// Result of a smart-notification attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartNotification {
    pub decision: ThrottleDecision,
    /// Audit entry, present when the notification was handed to the sink
    pub entry: Option<NotificationHistoryEntry>,
    pub platform_id: Option<String>,
}

/// Optimizer output plus the nudge set derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NudgeRecommendation {
    pub slots: Vec<OptimalTimeSlot>,
    pub nudges: Vec<ScheduledNudge>,
}

pub struct CadenceEngine {
    config: Config,
    history: Arc<dyn HistoryStore>,
    schedules: Arc<dyn ScheduleStore>,
    sink: Arc<dyn NotificationSink>,
    analyzer: PatternAnalyzer,
    correlations: CorrelationEngine,
    context_builder: ContextBuilder,
    scorer: SuggestionScorer,
    check_ins: CheckInScheduler,
    optimizer: NudgeTimeOptimizer,
    throttle: NotificationThrottle,
    rng: Mutex<Mcg128Xsl64>,
}

impl CadenceEngine {
    pub fn new(
        config: Config,
        history: Arc<dyn HistoryStore>,
        schedules: Arc<dyn ScheduleStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            analyzer: config.analysis.analyzer(),
            correlations: CorrelationEngine::new(),
            context_builder: ContextBuilder::new(),
            scorer: config.suggestions.scorer(),
            check_ins: CheckInScheduler::with_config(config.checkins.scheduler_config()),
            optimizer: config.nudges.optimizer(),
            throttle: NotificationThrottle::with_config(config.notifications.throttle_config()),
            rng: Mutex::new(Mcg128Xsl64::from_entropy()),
            config,
            history,
            schedules,
            sink,
        }
    }

    /// Fix the random source used for message and delay selection.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(Mcg128Xsl64::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn user_id(&self) -> &str {
        &self.config.user_id
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut Mcg128Xsl64) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut *rng)
    }

    // ── Analysis ─────────────────────────────────────────────────────

    /// Read the trailing history window ending at `now`.
    ///
    /// # Errors
    /// Propagates history store failures.
    pub async fn load_snapshot(&self, now: NaiveDateTime) -> crate::Result<HistorySnapshot> {
        let range = TimeRange::trailing_days(now, self.config.analysis.history_window_days);
        HistorySnapshot::load(self.history.as_ref(), range).await
    }

    /// Snapshot or an empty one, logging the failure.
    async fn snapshot_or_empty(&self, now: NaiveDateTime) -> HistorySnapshot {
        match self.load_snapshot(now).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "failed to load history; continuing with empty snapshot");
                HistorySnapshot::default()
            }
        }
    }

    pub fn patterns(&self, snapshot: &HistorySnapshot, now: NaiveDateTime) -> PatternData {
        self.analyzer.analyze(&snapshot.completions, now)
    }

    pub fn insights(&self, patterns: &PatternData) -> Vec<String> {
        self.analyzer.insights(patterns)
    }

    pub fn correlations(&self, snapshot: &HistorySnapshot) -> CorrelationReport {
        self.correlations
            .report(&snapshot.mood_entries, &snapshot.completions)
    }

    /// Latest self-reports from history, with neutral defaults.
    pub fn live_signals(&self, snapshot: &HistorySnapshot, calendar: Vec<CalendarEvent>) -> LiveSignals {
        let latest_mood = snapshot.latest_mood();
        let mut energy = snapshot
            .latest_energy()
            .map(|e| e.band())
            .unwrap_or(EnergyLevel::Medium);
        // A mood report tagged with energy overrides an older energy log
        if let Some(mood) = latest_mood {
            let newer = snapshot
                .latest_energy()
                .map_or(true, |e| mood.timestamp > e.timestamp);
            if let (true, Some(tagged)) = (newer, mood.energy) {
                energy = tagged;
            }
        }
        LiveSignals {
            energy,
            mood: latest_mood.map(|m| m.mood).unwrap_or(Mood::Neutral),
            last_activity: snapshot.last_activity(),
            calendar,
        }
    }

    pub fn context(
        &self,
        snapshot: &HistorySnapshot,
        signals: &LiveSignals,
        now: NaiveDateTime,
    ) -> SuggestionContext {
        let patterns = self.patterns(snapshot, now);
        self.context_builder.build(now, &patterns, signals)
    }

    /// Ranked suggestions for the open tasks.
    pub fn suggest(
        &self,
        snapshot: &HistorySnapshot,
        tasks: &[CandidateTask],
        signals: &LiveSignals,
        now: NaiveDateTime,
    ) -> Vec<TaskSuggestion> {
        let ctx = self.context(snapshot, signals, now);
        self.scorer.suggest(tasks, &ctx, now)
    }

    // ── Check-ins ────────────────────────────────────────────────────

    async fn recent_check_ins(&self, now: NaiveDateTime) -> Option<Vec<ProactiveCheckIn>> {
        let since = now - Duration::days(CHECK_IN_LOOKBACK_DAYS);
        match self.schedules.check_ins_since(self.user_id(), since).await {
            Ok(history) => Some(history),
            Err(e) => {
                error!(error = %e, "failed to load check-in history");
                None
            }
        }
    }

    /// Decide on, persist and deliver a proactive check-in.
    ///
    /// `signals` overrides the energy and mood read from history.
    pub async fn evaluate_check_in(
        &self,
        now: NaiveDateTime,
        signals: Option<&LiveSignals>,
    ) -> Option<ProactiveCheckIn> {
        if !self.config.checkins.enabled {
            debug!("check-ins disabled");
            return None;
        }

        let snapshot = self.snapshot_or_empty(now).await;
        let signals = signals
            .cloned()
            .unwrap_or_else(|| self.live_signals(&snapshot, Vec::new()));
        // Without history the cooldown cannot be enforced.
        let history = self.recent_check_ins(now).await?;

        let patterns = self.patterns(&snapshot, now);
        let profile = CheckInProfile::from_patterns(
            &patterns,
            self.check_ins.config(),
            signals.last_activity.or_else(|| snapshot.last_activity()),
        )
        .with_response_activity(&history);

        let mut check_in = self.with_rng(|rng| {
            self.check_ins
                .should_check_in(now, signals.energy, signals.mood, &profile, &history, rng)
        })?;

        if let Err(e) = self.schedules.save_check_in(self.user_id(), &check_in).await {
            error!(error = %e, "failed to persist check-in");
            return None;
        }

        let request = NotificationRequest::one_off(NudgeType::CheckIn, check_in.message.clone(), now);
        match self.sink.schedule(&request).await {
            Ok(Some(_)) => {
                check_in.mark_delivered();
                if let Err(e) = self.schedules.save_check_in(self.user_id(), &check_in).await {
                    warn!(error = %e, id = %check_in.id, "failed to mark check-in delivered");
                }
            }
            Ok(None) => debug!(id = %check_in.id, "sink declined check-in"),
            Err(e) => error!(error = %e, id = %check_in.id, "failed to deliver check-in"),
        }

        info!(id = %check_in.id, kind = check_in.check_in_type.as_str(), "check-in issued");
        Some(check_in)
    }

    /// Record the user's answer. The saved response time resets the
    /// inactivity clock for later evaluations.
    ///
    /// `None` if the check-in is unknown, already answered, or could not be
    /// saved.
    pub async fn respond_to_check_in(
        &self,
        id: &str,
        response: &str,
        now: NaiveDateTime,
    ) -> Option<ProactiveCheckIn> {
        let mut check_in = match self.schedules.get_check_in(self.user_id(), id).await {
            Ok(Some(check_in)) => check_in,
            Ok(None) => {
                debug!(%id, "unknown check-in");
                return None;
            }
            Err(e) => {
                error!(error = %e, %id, "failed to load check-in");
                return None;
            }
        };

        if !self.check_ins.respond(&mut check_in, response, now) {
            return None;
        }

        match self.schedules.save_check_in(self.user_id(), &check_in).await {
            Ok(()) => Some(check_in),
            Err(e) => {
                error!(error = %e, %id, "failed to save check-in response");
                None
            }
        }
    }

    /// Check-ins from the last `days` days, oldest first.
    pub async fn check_in_history(&self, now: NaiveDateTime, days: i64) -> Vec<ProactiveCheckIn> {
        let since = now - Duration::days(days);
        self.schedules
            .check_ins_since(self.user_id(), since)
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "failed to load check-in history");
                Vec::new()
            })
    }

    pub fn check_in_stats(&self, history: &[ProactiveCheckIn]) -> Vec<CheckInTypeStats> {
        self.check_ins.response_stats(history)
    }

    // ── Nudges ───────────────────────────────────────────────────────

    pub fn recommend_nudges(&self, snapshot: &HistorySnapshot, now: NaiveDateTime) -> NudgeRecommendation {
        let slots = self.optimizer.find_optimal_time_slots(
            &snapshot.focus_sessions,
            &snapshot.energy_logs,
            now,
        );
        let nudges = self.optimizer.generate_recommended_nudges(&slots);
        NudgeRecommendation { slots, nudges }
    }

    /// Replace the user's nudges with the recommended set and schedule each
    /// one on the sink. Returns what was persisted.
    pub async fn install_recommended_nudges(&self, now: NaiveDateTime) -> Vec<ScheduledNudge> {
        let snapshot = self.snapshot_or_empty(now).await;
        let NudgeRecommendation { nudges, .. } = self.recommend_nudges(&snapshot, now);

        if let Err(e) = self.schedules.replace_nudges(self.user_id(), &nudges).await {
            error!(error = %e, "failed to persist recommended nudges");
            return Vec::new();
        }

        if let Err(e) = self.sink.cancel_all().await {
            warn!(error = %e, "failed to clear previously scheduled notifications");
        }
        for nudge in nudges.iter().filter(|n| n.enabled) {
            let request = NotificationRequest::for_nudge(nudge, now);
            match self.sink.schedule(&request).await {
                Ok(Some(platform_id)) => {
                    debug!(id = %nudge.id, %platform_id, time = %nudge.scheduled_time, "nudge scheduled")
                }
                Ok(None) => warn!(id = %nudge.id, "sink declined nudge"),
                Err(e) => error!(error = %e, id = %nudge.id, "failed to schedule nudge"),
            }
        }

        info!(count = nudges.len(), "recommended nudges installed");
        nudges
    }

    /// # Errors
    /// Propagates schedule store failures.
    pub async fn nudges(&self) -> crate::Result<Vec<ScheduledNudge>> {
        self.schedules.list_nudges(self.user_id()).await
    }

    pub async fn set_nudge_enabled(&self, id: &str, enabled: bool) -> bool {
        self.schedules
            .set_nudge_enabled(self.user_id(), id, enabled)
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, %id, "failed to toggle nudge");
                false
            })
    }

    pub async fn delete_nudge(&self, id: &str) -> bool {
        self.schedules
            .delete_nudge(self.user_id(), id)
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, %id, "failed to delete nudge");
                false
            })
    }

    // ── Smart notifications ──────────────────────────────────────────

    async fn notification_history(&self, now: NaiveDateTime, days: i64) -> Option<Vec<NotificationHistoryEntry>> {
        let since = now - Duration::days(days);
        match self.schedules.notifications_since(self.user_id(), since).await {
            Ok(history) => Some(history),
            Err(e) => {
                error!(error = %e, "failed to load notification history");
                None
            }
        }
    }

    /// Throttle decision for a notification at `now`, without sending.
    /// `None` when the audit trail cannot be read.
    pub async fn check_notification(&self, now: NaiveDateTime, mood: Option<Mood>) -> Option<ThrottleDecision> {
        if !self.config.notifications.enabled {
            return Some(ThrottleDecision::Blocked {
                reason: BlockReason::Disabled,
            });
        }

        let history = self.notification_history(now, 1).await?;
        let snapshot = self.snapshot_or_empty(now).await;
        let optimal_hours = self.optimizer.optimal_hours(&self.optimizer.find_optimal_time_slots(
            &snapshot.focus_sessions,
            &snapshot.energy_logs,
            now,
        ));
        let mood = mood.or_else(|| snapshot.latest_mood().map(|m| m.mood));

        Some(self.with_rng(|rng| self.throttle.evaluate(now, mood, &history, &optimal_hours, rng)))
    }

    /// Run the throttle and, if allowed, hand the notification to the sink
    /// and append it to the audit trail.
    pub async fn send_smart_notification(
        &self,
        nudge_type: NudgeType,
        body: &str,
        now: NaiveDateTime,
        mood: Option<Mood>,
    ) -> Option<SmartNotification> {
        let decision = self.check_notification(now, mood).await?;
        let fire_at = match decision {
            ThrottleDecision::Allowed { fire_at, .. } => fire_at,
            ThrottleDecision::Blocked { .. } => {
                return Some(SmartNotification {
                    decision,
                    entry: None,
                    platform_id: None,
                })
            }
        };

        let request = NotificationRequest::one_off(nudge_type, body, fire_at);
        let platform_id = match self.sink.schedule(&request).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                warn!("sink declined smart notification");
                return None;
            }
            Err(e) => {
                error!(error = %e, "failed to schedule smart notification");
                return None;
            }
        };

        let entry = NotificationHistoryEntry::new(nudge_type, now).with_delivery_at(fire_at);
        if let Err(e) = self.schedules.append_notification(self.user_id(), &entry).await {
            error!(error = %e, "failed to record sent notification");
        }

        Some(SmartNotification {
            decision,
            entry: Some(entry),
            platform_id: Some(platform_id),
        })
    }

    /// Record how the user reacted to a notification. `false` if the entry is
    /// unknown or the update failed.
    pub async fn record_notification_feedback(
        &self,
        id: &str,
        feedback: NotificationFeedback,
        now: NaiveDateTime,
    ) -> bool {
        let Some(history) = self
            .notification_history(now, NOTIFICATION_LOOKBACK_DAYS)
            .await
        else {
            return false;
        };
        let Some(mut entry) = history.into_iter().find(|e| e.id == id) else {
            debug!(%id, "unknown notification");
            return false;
        };

        match feedback {
            NotificationFeedback::Acknowledged => {
                entry.acknowledged_at.get_or_insert(now);
            }
            NotificationFeedback::Dismissed => entry.dismissed = true,
            NotificationFeedback::ActedOn => {
                entry.acknowledged_at.get_or_insert(now);
                entry.action_taken = true;
            }
        }

        self.schedules
            .update_notification(self.user_id(), &entry)
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, %id, "failed to update notification");
                false
            })
    }

    /// Engagement report over the last `days` days.
    pub async fn notification_effectiveness(&self, now: NaiveDateTime, days: i64) -> Option<NudgeEffectiveness> {
        let history = self.notification_history(now, days).await?;
        Some(NudgeEffectiveness::from_history(&history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkin::CheckInType;
    use crate::history::{CompletionRecord, EnergyEntry, MemoryHistoryStore, MoodEntry};
    use crate::notify::MemorySink;
    use crate::storage::EngineDb;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    struct Harness {
        engine: CadenceEngine,
        schedules: Arc<EngineDb>,
        sink: Arc<MemorySink>,
    }

    fn harness(config: Config, history: MemoryHistoryStore) -> Harness {
        let schedules = Arc::new(EngineDb::open_memory().unwrap());
        let sink = Arc::new(MemorySink::new());
        let engine = CadenceEngine::new(config, Arc::new(history), schedules.clone(), sink.clone())
            .with_seed(42);
        Harness {
            engine,
            schedules,
            sink,
        }
    }

    #[tokio::test]
    async fn new_user_gets_no_check_in_and_default_nudges() {
        let h = harness(Config::default(), MemoryHistoryStore::new());
        let now = at(18, 10, 0);

        assert!(h.engine.evaluate_check_in(now, None).await.is_none());

        let nudges = h.engine.install_recommended_nudges(now).await;
        assert_eq!(nudges.len(), 3);
        assert_eq!(h.engine.nudges().await.unwrap().len(), 3);
        assert_eq!(h.sink.scheduled().len(), 3);
    }

    #[tokio::test]
    async fn long_inactivity_check_in_is_persisted_and_delivered() {
        let mut history = MemoryHistoryStore::new();
        history.push_completion(CompletionRecord::new("t", "Write", EnergyLevel::Medium, at(18, 8, 0)));
        let h = harness(Config::default(), history);
        let now = at(18, 11, 0);

        let check_in = h.engine.evaluate_check_in(now, None).await.unwrap();
        assert!(check_in.delivered);
        let stored = h.schedules.get_check_in("local", &check_in.id).await.unwrap();
        assert_eq!(stored, Some(check_in.clone()));

        // Cooldown blocks an immediate second one
        assert!(h.engine.evaluate_check_in(at(18, 11, 10), None).await.is_none());

        let answered = h
            .engine
            .respond_to_check_in(&check_in.id, "ok", at(18, 11, 5))
            .await
            .unwrap();
        assert!(answered.responded);
        assert!(h
            .engine
            .respond_to_check_in(&check_in.id, "again", at(18, 11, 6))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn answering_a_check_in_resets_inactivity() {
        let mut history = MemoryHistoryStore::new();
        history.push_completion(CompletionRecord::new("t", "Write", EnergyLevel::Medium, at(18, 8, 0)));
        let h = harness(Config::default(), history);

        let first = h.engine.evaluate_check_in(at(18, 11, 0), None).await.unwrap();
        assert_eq!(first.check_in_type, CheckInType::LongInactivity);
        let answered = h
            .engine
            .respond_to_check_in(&first.id, "back", at(18, 11, 1))
            .await
            .unwrap();
        assert_eq!(answered.responded_at, Some(at(18, 11, 1)));

        assert!(h.engine.evaluate_check_in(at(18, 11, 2), None).await.is_none());
        // Long inactivity again 90 minutes after the answer
        assert!(h.engine.evaluate_check_in(at(18, 12, 31), None).await.is_none());
        let next = h.engine.evaluate_check_in(at(18, 12, 32), None).await.unwrap();
        assert_eq!(next.check_in_type, CheckInType::LongInactivity);
    }

    #[tokio::test]
    async fn disabled_check_ins_never_fire() {
        let mut config = Config::default();
        config.checkins.enabled = false;
        let mut history = MemoryHistoryStore::new();
        history.push_completion(CompletionRecord::new("t", "Write", EnergyLevel::Medium, at(18, 8, 0)));
        let h = harness(config, history);
        assert!(h.engine.evaluate_check_in(at(18, 11, 0), None).await.is_none());
    }

    #[tokio::test]
    async fn smart_notifications_stop_at_the_hourly_limit() {
        let h = harness(Config::default(), MemoryHistoryStore::new());
        let mut sent = 0;
        for minute in [0, 10, 20, 30] {
            let result = h
                .engine
                .send_smart_notification(NudgeType::Encouragement, "Keep going", at(18, 12, minute), None)
                .await
                .unwrap();
            if result.decision.is_allowed() {
                sent += 1;
            } else {
                assert_eq!(
                    result.decision,
                    ThrottleDecision::Blocked {
                        reason: BlockReason::RateLimited
                    }
                );
            }
        }
        assert_eq!(sent, 3);
        assert_eq!(h.sink.scheduled().len(), 3);
    }

    #[tokio::test]
    async fn delayed_deliveries_never_exceed_the_hourly_limit() {
        let h = harness(Config::default(), MemoryHistoryStore::new());
        let mut deliveries = Vec::new();
        for minute in 0..240 {
            let now = at(18, 12, 0) + Duration::minutes(minute);
            let result = h
                .engine
                .send_smart_notification(NudgeType::Encouragement, "Keep going", now, None)
                .await
                .unwrap();
            if let Some(entry) = result.entry {
                let ThrottleDecision::Allowed { fire_at, .. } = result.decision else {
                    panic!("entry recorded for a blocked notification");
                };
                assert_eq!(entry.deliver_at, fire_at);
                deliveries.push(fire_at);
            }
        }

        assert!(deliveries.len() > 3);
        for &opens in &deliveries {
            let in_window = deliveries
                .iter()
                .filter(|&&d| d >= opens && d < opens + Duration::minutes(60))
                .count();
            assert!(in_window <= 3, "{in_window} deliveries from {opens}");
        }
        let stored = h
            .schedules
            .notifications_since("local", at(18, 0, 0))
            .await
            .unwrap();
        assert_eq!(stored.len(), deliveries.len());
    }

    #[tokio::test]
    async fn quiet_hours_and_disabled_block() {
        let h = harness(Config::default(), MemoryHistoryStore::new());
        let decision = h.engine.check_notification(at(18, 23, 0), None).await.unwrap();
        assert_eq!(
            decision,
            ThrottleDecision::Blocked {
                reason: BlockReason::QuietHours
            }
        );

        let mut config = Config::default();
        config.notifications.enabled = false;
        let h = harness(config, MemoryHistoryStore::new());
        let decision = h.engine.check_notification(at(18, 12, 0), None).await.unwrap();
        assert_eq!(
            decision,
            ThrottleDecision::Blocked {
                reason: BlockReason::Disabled
            }
        );
    }

    #[tokio::test]
    async fn feedback_updates_effectiveness() {
        let h = harness(Config::default(), MemoryHistoryStore::new());
        let now = at(18, 12, 0);
        let sent = h
            .engine
            .send_smart_notification(NudgeType::TaskSuggestion, "Try this", now, None)
            .await
            .unwrap();
        let id = sent.entry.unwrap().id;

        assert!(
            h.engine
                .record_notification_feedback(&id, NotificationFeedback::ActedOn, at(18, 12, 5))
                .await
        );
        assert!(
            !h.engine
                .record_notification_feedback("missing", NotificationFeedback::Dismissed, now)
                .await
        );

        let report = h.engine.notification_effectiveness(at(18, 13, 0), 7).await.unwrap();
        assert_eq!(report.overall.sent, 1);
        assert_eq!(report.overall.action_rate(), 1.0);
        assert_eq!(report.overall.acknowledgement_rate(), 1.0);
    }

    #[test]
    fn live_signals_prefer_latest_reports() {
        let h = harness(Config::default(), MemoryHistoryStore::new());
        let snapshot = HistorySnapshot {
            energy_logs: vec![EnergyEntry::new(9, at(18, 9, 0))],
            mood_entries: vec![MoodEntry::new(Mood::Low, at(18, 10, 0))],
            ..HistorySnapshot::default()
        };
        let signals = h.engine.live_signals(&snapshot, Vec::new());
        assert_eq!(signals.energy, EnergyLevel::High);
        assert_eq!(signals.mood, Mood::Low);
        assert_eq!(signals.last_activity, Some(at(18, 10, 0)));

        let empty = h.engine.live_signals(&HistorySnapshot::default(), Vec::new());
        assert_eq!(empty.energy, EnergyLevel::Medium);
        assert_eq!(empty.mood, Mood::Neutral);
    }

    #[tokio::test]
    async fn suggestions_use_history_context() {
        let mut history = MemoryHistoryStore::new();
        history.push_mood(MoodEntry::new(Mood::Low, at(18, 9, 0)));
        history.push_energy(EnergyEntry::new(2, at(18, 9, 0)));
        let h = harness(Config::default(), history);
        let now = at(18, 9, 30);

        let snapshot = h.engine.load_snapshot(now).await.unwrap();
        let signals = h.engine.live_signals(&snapshot, Vec::new());
        let task = |id: &str, energy, is_micro_step| CandidateTask {
            id: id.to_string(),
            title: id.to_string(),
            energy,
            is_micro_step,
            completed: false,
            created_at: now,
        };
        let tasks = vec![task("hard", EnergyLevel::High, false), task("easy", EnergyLevel::Low, true)];
        let suggestions = h.engine.suggest(&snapshot, &tasks, &signals, now);
        assert_eq!(suggestions[0].task_id, "easy");
        assert_eq!(suggestions[0].score, 100.0);
    }
}
