//! Proactive check-ins.
//!
//! A check-in moves through `scheduled -> delivered -> responded | ignored`.
//! [`CheckInScheduler::should_check_in`] walks a priority-ordered rule list and
//! returns at most one new check-in, never while an unanswered one is still
//! inside the cooldown window.

use chrono::{Duration, NaiveDateTime, Timelike};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::history::{EnergyLevel, Mood};
use crate::patterns::{PatternAnalyzer, PatternData};

/// Why a check-in fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInType {
    LongInactivity,
    PeakTime,
    EnergyDip,
    MoodBased,
    PatternBased,
}

impl CheckInType {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckInType::LongInactivity => "long_inactivity",
            CheckInType::PeakTime => "peak_time",
            CheckInType::EnergyDip => "energy_dip",
            CheckInType::MoodBased => "mood_based",
            CheckInType::PatternBased => "pattern_based",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "long_inactivity" => Some(CheckInType::LongInactivity),
            "peak_time" => Some(CheckInType::PeakTime),
            "energy_dip" => Some(CheckInType::EnergyDip),
            "mood_based" => Some(CheckInType::MoodBased),
            "pattern_based" => Some(CheckInType::PatternBased),
            _ => None,
        }
    }

    fn messages(self) -> &'static [&'static str] {
        match self {
            CheckInType::LongInactivity => &[
                "It's been a while. Want to pick one small thing to do?",
                "Still there? A two-minute task could get things rolling.",
                "Taking a long break is fine. Ready to ease back in?",
            ],
            CheckInType::PeakTime => &[
                "This is usually one of your best hours. Anything you want to tackle?",
                "Your energy tends to peak around now. Good moment for focused work.",
                "Peak time! What's the one task that would make today feel good?",
            ],
            CheckInType::EnergyDip => &[
                "This hour is often slow for you. How about something light?",
                "Energy dips happen. A short walk or an easy task might help.",
                "Feeling the afternoon slump? Pick a tiny step.",
            ],
            CheckInType::MoodBased => &[
                "You mentioned feeling low. Want to try something gentle?",
                "Rough day? One small win can shift things a little.",
                "Be kind to yourself. Is there an easy task you could do?",
            ],
            CheckInType::PatternBased => &[
                "You often get things done at this time. Want a suggestion?",
                "This is usually a productive hour for you. Ready to start?",
                "Around now you tend to finish tasks. Shall we pick one?",
            ],
        }
    }
}

/// Derived lifecycle state of a check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInState {
    Scheduled,
    Delivered,
    Responded,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProactiveCheckIn {
    pub id: String,
    pub check_in_type: CheckInType,
    pub message: String,
    pub scheduled_time: NaiveDateTime,
    pub delivered: bool,
    pub responded: bool,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub responded_at: Option<NaiveDateTime>,
    /// Energy and mood at decision time
    pub energy: EnergyLevel,
    pub mood: Mood,
}

impl ProactiveCheckIn {
    pub fn state(&self, now: NaiveDateTime, cooldown: Duration) -> CheckInState {
        if self.responded {
            CheckInState::Responded
        } else if !self.delivered {
            CheckInState::Scheduled
        } else if now - self.scheduled_time >= cooldown {
            CheckInState::Ignored
        } else {
            CheckInState::Delivered
        }
    }

    pub fn mark_delivered(&mut self) {
        self.delivered = true;
    }
}

/// Thresholds for the check-in rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInConfig {
    pub cooldown_minutes: i64,
    /// Inclusive waking window for the long-inactivity rule
    pub waking_start_hour: u8,
    pub waking_end_hour: u8,
    /// Half-open working window searched for energy dips
    pub working_start_hour: u8,
    pub working_end_hour: u8,
    pub long_inactivity_minutes: i64,
    pub peak_inactivity_minutes: i64,
    pub mood_inactivity_minutes: i64,
    pub pattern_inactivity_minutes: i64,
    /// Completions at this hour must exceed this for the pattern rule
    pub pattern_min_completions: u64,
}

impl Default for CheckInConfig {
    fn default() -> Self {
        Self {
            cooldown_minutes: 30,
            waking_start_hour: 8,
            waking_end_hour: 22,
            working_start_hour: 9,
            working_end_hour: 18,
            long_inactivity_minutes: 90,
            peak_inactivity_minutes: 30,
            mood_inactivity_minutes: 20,
            pattern_inactivity_minutes: 45,
            pattern_min_completions: 5,
        }
    }
}

impl CheckInConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::minutes(self.cooldown_minutes)
    }
}

/// What the scheduler knows about the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInProfile {
    pub check_ins_enabled: bool,
    pub peak_hours: Vec<u8>,
    /// Two quietest working hours, empty without history
    pub low_hours: Vec<u8>,
    pub completions_by_hour: Vec<u64>,
    pub last_activity_at: Option<NaiveDateTime>,
}

impl CheckInProfile {
    /// Answering a check-in resets the inactivity clock.
    pub fn with_response_activity(mut self, history: &[ProactiveCheckIn]) -> Self {
        self.last_activity_at = self.last_activity_at.max(last_response_at(history));
        self
    }

    pub fn from_patterns(
        patterns: &PatternData,
        config: &CheckInConfig,
        last_activity_at: Option<NaiveDateTime>,
    ) -> Self {
        let low_hours = PatternAnalyzer::new().least_productive_hours(
            &patterns.hourly_stats,
            config.working_start_hour..config.working_end_hour,
            2,
        );
        Self {
            check_ins_enabled: true,
            peak_hours: patterns.peak_hours.clone(),
            low_hours,
            completions_by_hour: patterns
                .hourly_stats
                .iter()
                .map(|s| s.completion_count)
                .collect(),
            last_activity_at,
        }
    }

    fn completions_at(&self, hour: u8) -> u64 {
        self.completions_by_hour
            .get(hour as usize)
            .copied()
            .unwrap_or(0)
    }
}

/// Most recent answer to any check-in in `history`.
pub fn last_response_at(history: &[ProactiveCheckIn]) -> Option<NaiveDateTime> {
    history.iter().filter_map(|c| c.responded_at).max()
}

/// Response counts per check-in type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInTypeStats {
    pub check_in_type: CheckInType,
    pub total: usize,
    pub responded: usize,
    pub response_rate: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CheckInScheduler {
    config: CheckInConfig,
}

impl CheckInScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CheckInConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckInConfig {
        &self.config
    }

    /// Decide whether a check-in should fire at `now`.
    ///
    /// `history` is the user's previous check-ins, in any order.
    pub fn should_check_in<R: Rng + ?Sized>(
        &self,
        now: NaiveDateTime,
        energy: EnergyLevel,
        mood: Mood,
        profile: &CheckInProfile,
        history: &[ProactiveCheckIn],
        rng: &mut R,
    ) -> Option<ProactiveCheckIn> {
        if !profile.check_ins_enabled {
            return None;
        }
        if self.in_cooldown(now, history) {
            tracing::debug!("check-in suppressed by cooldown");
            return None;
        }

        let check_in_type = self.match_rule(now, mood, profile)?;
        let message = check_in_type
            .messages()
            .choose(rng)
            .copied()
            .unwrap_or_default()
            .to_string();

        tracing::debug!(kind = check_in_type.as_str(), "check-in triggered");
        Some(ProactiveCheckIn {
            id: Uuid::new_v4().to_string(),
            check_in_type,
            message,
            scheduled_time: now,
            delivered: false,
            responded: false,
            response: None,
            responded_at: None,
            energy,
            mood,
        })
    }

    /// An unanswered check-in younger than the cooldown blocks new ones.
    pub fn in_cooldown(&self, now: NaiveDateTime, history: &[ProactiveCheckIn]) -> bool {
        let cooldown = self.config.cooldown();
        history.iter().any(|c| {
            !c.responded && c.scheduled_time <= now && now - c.scheduled_time < cooldown
        })
    }

    fn match_rule(&self, now: NaiveDateTime, mood: Mood, profile: &CheckInProfile) -> Option<CheckInType> {
        let cfg = &self.config;
        let hour = now.hour() as u8;
        let idle = profile
            .last_activity_at
            .map(|last| (now - last).num_minutes());
        let idle_over = |minutes: i64| idle.is_some_and(|i| i > minutes);

        let waking = (cfg.waking_start_hour..=cfg.waking_end_hour).contains(&hour);
        if waking && idle_over(cfg.long_inactivity_minutes) {
            return Some(CheckInType::LongInactivity);
        }
        if profile.peak_hours.contains(&hour) && idle_over(cfg.peak_inactivity_minutes) {
            return Some(CheckInType::PeakTime);
        }
        if profile.low_hours.contains(&hour) {
            return Some(CheckInType::EnergyDip);
        }
        if mood == Mood::Low && idle_over(cfg.mood_inactivity_minutes) {
            return Some(CheckInType::MoodBased);
        }
        if profile.completions_at(hour) > cfg.pattern_min_completions
            && idle_over(cfg.pattern_inactivity_minutes)
        {
            return Some(CheckInType::PatternBased);
        }
        None
    }

    /// Record the user's answer. `responded_at` counts as activity, see
    /// [`last_response_at`].
    ///
    /// Returns `false` if the check-in was already answered.
    pub fn respond(&self, check_in: &mut ProactiveCheckIn, response: &str, now: NaiveDateTime) -> bool {
        if check_in.responded {
            return false;
        }
        check_in.delivered = true;
        check_in.responded = true;
        check_in.response = Some(response.to_string());
        check_in.responded_at = Some(now);
        true
    }

    pub fn response_stats(&self, history: &[ProactiveCheckIn]) -> Vec<CheckInTypeStats> {
        let mut by_type: BTreeMap<CheckInType, (usize, usize)> = BTreeMap::new();
        for c in history {
            let entry = by_type.entry(c.check_in_type).or_insert((0, 0));
            entry.0 += 1;
            if c.responded {
                entry.1 += 1;
            }
        }
        by_type
            .into_iter()
            .map(|(check_in_type, (total, responded))| CheckInTypeStats {
                check_in_type,
                total,
                responded,
                response_rate: responded as f64 / total as f64,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand_pcg::Mcg128Xsl64;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn profile(last_activity: Option<NaiveDateTime>) -> CheckInProfile {
        CheckInProfile {
            check_ins_enabled: true,
            peak_hours: vec![10, 14, 9],
            low_hours: vec![15, 16],
            completions_by_hour: {
                let mut v = vec![0; 24];
                v[19] = 6;
                v
            },
            last_activity_at: last_activity,
        }
    }

    fn rng() -> Mcg128Xsl64 {
        Mcg128Xsl64::seed_from_u64(7)
    }

    fn decide(now: NaiveDateTime, mood: Mood, p: &CheckInProfile) -> Option<CheckInType> {
        CheckInScheduler::new()
            .should_check_in(now, EnergyLevel::Medium, mood, p, &[], &mut rng())
            .map(|c| c.check_in_type)
    }

    #[test]
    fn long_inactivity_wins_first() {
        let p = profile(Some(at(8, 0)));
        assert_eq!(decide(at(10, 0), Mood::Low, &p), Some(CheckInType::LongInactivity));
    }

    #[test]
    fn long_inactivity_only_while_awake() {
        let p = profile(Some(at(0, 0)));
        assert_eq!(decide(at(4, 0), Mood::Neutral, &p), None);
    }

    #[test]
    fn peak_time_after_thirty_minutes() {
        let p = profile(Some(at(9, 25)));
        assert_eq!(decide(at(10, 0), Mood::Neutral, &p), Some(CheckInType::PeakTime));
        let p = profile(Some(at(9, 40)));
        assert_eq!(decide(at(10, 0), Mood::Neutral, &p), None);
    }

    #[test]
    fn energy_dip_needs_no_inactivity() {
        let p = profile(Some(at(15, 0)));
        assert_eq!(decide(at(15, 5), Mood::Neutral, &p), Some(CheckInType::EnergyDip));
    }

    #[test]
    fn mood_and_pattern_rules() {
        let p = profile(Some(at(12, 30)));
        assert_eq!(decide(at(12, 55), Mood::Low, &p), Some(CheckInType::MoodBased));
        assert_eq!(decide(at(12, 55), Mood::Neutral, &p), None);

        let p = profile(Some(at(18, 30)));
        assert_eq!(decide(at(19, 20), Mood::Neutral, &p), Some(CheckInType::PatternBased));
    }

    #[test]
    fn disabled_profile_never_fires() {
        let mut p = profile(Some(at(6, 0)));
        p.check_ins_enabled = false;
        assert_eq!(decide(at(12, 0), Mood::Low, &p), None);
    }

    #[test]
    fn new_user_gets_nothing() {
        let patterns = PatternAnalyzer::new().analyze(&[], at(10, 0));
        let p = CheckInProfile::from_patterns(&patterns, &CheckInConfig::default(), None);
        for hour in 0..24 {
            assert_eq!(decide(at(hour, 30), Mood::Low, &p), None, "hour {hour}");
        }
    }

    #[test]
    fn cooldown_blocks_unanswered() {
        let scheduler = CheckInScheduler::new();
        let p = profile(Some(at(8, 0)));
        let mut first = scheduler
            .should_check_in(at(10, 0), EnergyLevel::Low, Mood::Neutral, &p, &[], &mut rng())
            .unwrap();
        first.mark_delivered();
        let history = vec![first.clone()];

        assert!(scheduler
            .should_check_in(at(10, 29), EnergyLevel::Low, Mood::Neutral, &p, &history, &mut rng())
            .is_none());
        assert!(scheduler
            .should_check_in(at(10, 30), EnergyLevel::Low, Mood::Neutral, &p, &history, &mut rng())
            .is_some());

        first.responded = true;
        assert!(scheduler
            .should_check_in(at(10, 5), EnergyLevel::Low, Mood::Neutral, &p, &[first], &mut rng())
            .is_some());
    }

    #[test]
    fn respond_records_and_resets_clock() {
        let scheduler = CheckInScheduler::new();
        let p = profile(Some(at(8, 0)));
        let mut check_in = scheduler
            .should_check_in(at(10, 0), EnergyLevel::Low, Mood::Neutral, &p, &[], &mut rng())
            .unwrap();
        assert!(CheckInType::LongInactivity.messages().contains(&check_in.message.as_str()));

        assert!(scheduler.respond(&mut check_in, "on it", at(10, 2)));
        assert_eq!(check_in.response.as_deref(), Some("on it"));
        assert_eq!(check_in.responded_at, Some(at(10, 2)));
        assert!(!scheduler.respond(&mut check_in, "again", at(10, 3)));
        assert_eq!(check_in.responded_at, Some(at(10, 2)));
        assert_eq!(check_in.state(at(11, 0), Duration::minutes(30)), CheckInState::Responded);

        let history = [check_in];
        let p = p.with_response_activity(&history);
        assert_eq!(p.last_activity_at, Some(at(10, 2)));
        assert_eq!(decide(at(10, 5), Mood::Neutral, &p), None);
    }

    #[test]
    fn older_response_keeps_newer_activity() {
        let earlier = profile(Some(at(8, 0)));
        let mut answered = CheckInScheduler::new()
            .should_check_in(at(10, 0), EnergyLevel::Low, Mood::Neutral, &earlier, &[], &mut rng())
            .unwrap();
        answered.responded_at = Some(at(10, 1));

        let p = profile(Some(at(12, 0))).with_response_activity(&[answered.clone()]);
        assert_eq!(p.last_activity_at, Some(at(12, 0)));
        let p = profile(None).with_response_activity(&[answered]);
        assert_eq!(p.last_activity_at, Some(at(10, 1)));
        assert_eq!(last_response_at(&[]), None);
    }

    #[test]
    fn state_transitions() {
        let cooldown = Duration::minutes(30);
        let mut c = ProactiveCheckIn {
            id: "c".into(),
            check_in_type: CheckInType::PeakTime,
            message: String::new(),
            scheduled_time: at(10, 0),
            delivered: false,
            responded: false,
            response: None,
            responded_at: None,
            energy: EnergyLevel::Medium,
            mood: Mood::Neutral,
        };
        assert_eq!(c.state(at(10, 5), cooldown), CheckInState::Scheduled);
        c.mark_delivered();
        assert_eq!(c.state(at(10, 5), cooldown), CheckInState::Delivered);
        assert_eq!(c.state(at(10, 45), cooldown), CheckInState::Ignored);
    }

    #[test]
    fn seeded_rng_picks_same_message() {
        let scheduler = CheckInScheduler::new();
        let p = profile(Some(at(8, 0)));
        let a = scheduler.should_check_in(at(10, 0), EnergyLevel::Low, Mood::Low, &p, &[], &mut rng());
        let b = scheduler.should_check_in(at(10, 0), EnergyLevel::Low, Mood::Low, &p, &[], &mut rng());
        assert_eq!(a.unwrap().message, b.unwrap().message);
    }

    #[test]
    fn response_rate_per_type() {
        let scheduler = CheckInScheduler::new();
        let p = profile(Some(at(8, 0)));
        let mut a = scheduler
            .should_check_in(at(10, 0), EnergyLevel::Low, Mood::Low, &p, &[], &mut rng())
            .unwrap();
        let b = a.clone();
        a.responded = true;
        let stats = scheduler.response_stats(&[a, b]);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total, 2);
        assert!((stats[0].response_rate - 0.5).abs() < f64::EPSILON);
    }
}
