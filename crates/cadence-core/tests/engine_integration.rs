//! Integration tests for the engine over SQLite-backed stores.

use std::sync::Arc;

use cadence_core::nudge::{weekdays, NudgeTime};
use cadence_core::storage::DB_FILE;
use cadence_core::{
    CadenceEngine, CandidateTask, CheckInScheduler, CompletionRecord, Config, ContextBuilder,
    EnergyLevel, EngineDb, FocusTimer, HistoryDb, LiveSignals, MemorySink, Mood, NudgeType,
    PatternAnalyzer, ScheduleStore, ScheduledNudge, SuggestionScorer, TimerState,
};
use cadence_core::checkin::CheckInProfile;
use cadence_core::nudge::NudgeTimeOptimizer;
use chrono::{NaiveDate, NaiveDateTime};
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

#[test]
fn test_peak_hours_from_completion_history() {
    let mut records: Vec<CompletionRecord> = (0..5)
        .map(|i| CompletionRecord::new(format!("t{i}"), "Write", EnergyLevel::Medium, at(10 + i, 10, 15)))
        .collect();
    records.push(CompletionRecord::new("t5", "Review", EnergyLevel::Low, at(12, 14, 0)));

    let patterns = PatternAnalyzer::new().analyze(&records, at(18, 12, 0));

    assert_eq!(patterns.peak_hours.len(), 3);
    assert_eq!(patterns.peak_hours[0], 10);
    assert_eq!(patterns.peak_hours[1], 14);
    // Padded from the default peak hours
    assert_eq!(patterns.peak_hours[2], 9);
    assert_eq!(patterns.total_completions, 6);
}

#[test]
fn test_gentle_task_scores_capped_for_low_state() {
    let now = at(18, 15, 0);
    let patterns = PatternAnalyzer::new().analyze(&[], now);
    let signals = LiveSignals {
        energy: EnergyLevel::Low,
        mood: Mood::Low,
        last_activity: Some(at(18, 14, 50)),
        calendar: Vec::new(),
    };
    let ctx = ContextBuilder::new().build(now, &patterns, &signals);

    let task = CandidateTask {
        id: "email".to_string(),
        title: "Reply to one email".to_string(),
        energy: EnergyLevel::Low,
        is_micro_step: true,
        completed: false,
        created_at: now,
    };
    let suggestions = SuggestionScorer::new().suggest(&[task], &ctx, now);

    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].score, 100.0);
    assert_eq!(suggestions[0].confidence, 1.0);
}

#[test]
fn test_new_user_gets_defaults_without_errors() {
    let now = at(18, 11, 0);
    let scheduler = CheckInScheduler::new();
    let patterns = PatternAnalyzer::new().analyze(&[], now);
    let profile = CheckInProfile::from_patterns(&patterns, scheduler.config(), None);
    let mut rng = Mcg128Xsl64::seed_from_u64(7);

    let check_in = scheduler.should_check_in(
        now,
        EnergyLevel::Medium,
        Mood::Neutral,
        &profile,
        &[],
        &mut rng,
    );
    assert!(check_in.is_none());

    let slots = NudgeTimeOptimizer::new().find_optimal_time_slots(&[], &[], now);
    assert_eq!(slots.len(), 3);
    assert!(slots.iter().all(|s| s.confidence == 40));
}

#[tokio::test]
async fn test_scheduled_nudge_round_trip() {
    let db = EngineDb::open_memory().unwrap();
    let mut nudge = ScheduledNudge::new(
        NudgeTime::new(7, 45).unwrap(),
        NudgeType::EnergyCheck,
        "How are you feeling?",
        [0, 6].into_iter().collect(),
    );
    nudge.enabled = false;

    db.save_nudge("alice", &nudge).await.unwrap();
    let loaded = db.get_nudge("alice", &nudge.id).await.unwrap();
    assert_eq!(loaded, Some(nudge.clone()));

    // Scoped per user
    assert_eq!(db.get_nudge("bob", &nudge.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_finished_focus_session_drives_nudge_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DB_FILE);
    let history = Arc::new(HistoryDb::open_at(&path).unwrap());
    let schedules = Arc::new(EngineDb::open_at(&path).unwrap());
    let sink = Arc::new(MemorySink::new());

    let mut timer = FocusTimer::new(25).with_task("deep-work");
    timer.start(at(18, 10, 0));
    timer.tick(at(18, 10, 25));
    assert_eq!(timer.state(), TimerState::Completed);
    let record = timer.to_record().unwrap();
    history.append_focus_session(&record).unwrap();

    let engine = CadenceEngine::new(Config::default(), history, schedules.clone(), sink.clone())
        .with_seed(3);
    let installed = engine.install_recommended_nudges(at(18, 20, 0)).await;

    assert_eq!(installed.len(), 3);
    let focus = &installed[0];
    assert_eq!(focus.nudge_type, NudgeType::FocusReminder);
    assert_eq!(focus.scheduled_time, NudgeTime::at_hour(10));
    // 2024-06-18 is a Tuesday
    assert_eq!(focus.repeat_days, [2].into_iter().collect());
    assert_eq!(installed[2].repeat_days, weekdays());

    let stored = schedules.list_nudges("local").await.unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(sink.scheduled().len(), 3);

    // Reinstalling replaces rather than duplicates
    engine.install_recommended_nudges(at(18, 21, 0)).await;
    assert_eq!(schedules.list_nudges("local").await.unwrap().len(), 3);
    assert_eq!(sink.scheduled().len(), 3);
}

#[tokio::test]
async fn test_check_in_response_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DB_FILE);
    let history = HistoryDb::open_at(&path).unwrap();
    history
        .append_completion(&CompletionRecord::new("t", "Plan", EnergyLevel::High, at(18, 8, 30)))
        .unwrap();

    let engine = CadenceEngine::new(
        Config::default(),
        Arc::new(history),
        Arc::new(EngineDb::open_at(&path).unwrap()),
        Arc::new(MemorySink::new()),
    )
    .with_seed(11);

    let check_in = engine.evaluate_check_in(at(18, 12, 0), None).await.unwrap();
    engine
        .respond_to_check_in(&check_in.id, "back at it", at(18, 12, 2))
        .await
        .unwrap();

    let reopened = EngineDb::open_at(&path).unwrap();
    let stored = reopened.get_check_in("local", &check_in.id).await.unwrap().unwrap();
    assert!(stored.responded);
    assert_eq!(stored.response.as_deref(), Some("back at it"));

    let history = engine.check_in_history(at(18, 13, 0), 1).await;
    let stats = engine.check_in_stats(&history);
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].response_rate, 1.0);
}
