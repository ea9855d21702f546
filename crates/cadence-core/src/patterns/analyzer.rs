//! Hourly/daily aggregation of completions.
//!
//! Statistics are rebuilt from the full snapshot on every call. When there is
//! no history the analyzer falls back to a canonical working pattern so new
//! users still get workable peak hours and best days.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::history::CompletionRecord;

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Completion statistics for one hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyStat {
    /// Hour of day (0-23)
    pub hour: u8,
    pub completion_count: u64,
    /// Mean energy weight (1-3) of completions in this hour, 0 when empty
    pub average_energy: f64,
    /// Share of all completions that fell in this hour (0.0-1.0)
    pub success_rate: f64,
}

/// Completion statistics for one day of the week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    /// Day of week (0-6, Sunday=0)
    pub day_of_week: u8,
    pub completion_count: u64,
    pub average_energy: f64,
}

/// Direction of the trailing week against the week before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeeklyTrend {
    Improving,
    Stable,
    Declining,
}

impl WeeklyTrend {
    pub fn name(self) -> &'static str {
        match self {
            WeeklyTrend::Improving => "improving",
            WeeklyTrend::Stable => "stable",
            WeeklyTrend::Declining => "declining",
        }
    }
}

/// Everything the analyzer derives from one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternData {
    pub hourly_stats: Vec<HourlyStat>,
    pub daily_stats: Vec<DailyStat>,
    /// Up to three hours, busiest first
    pub peak_hours: Vec<u8>,
    /// Up to three weekdays, busiest first
    pub best_days: Vec<u8>,
    pub total_completions: u64,
    pub weekly_trend: WeeklyTrend,
}

impl PatternData {
    pub fn is_peak_hour(&self, hour: u8) -> bool {
        self.peak_hours.contains(&hour)
    }

    pub fn completions_at(&self, hour: u8) -> u64 {
        self.hourly_stats
            .get(hour as usize)
            .map(|s| s.completion_count)
            .unwrap_or(0)
    }
}

/// Analyzer for completion patterns.
#[derive(Debug, Clone)]
pub struct PatternAnalyzer {
    /// Returned (and used as filler) when history is too thin
    pub default_peak_hours: Vec<u8>,
    pub default_best_days: Vec<u8>,
    /// How many peak hours / best days to report
    pub top_n: usize,
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternAnalyzer {
    pub const IMPROVING_RATIO: f64 = 1.2;
    pub const DECLINING_RATIO: f64 = 0.8;

    pub fn new() -> Self {
        Self {
            default_peak_hours: vec![9, 10, 11],
            default_best_days: vec![1, 2, 3],
            top_n: 3,
        }
    }

    pub fn with_defaults(default_peak_hours: Vec<u8>, default_best_days: Vec<u8>) -> Self {
        Self {
            default_peak_hours,
            default_best_days,
            top_n: 3,
        }
    }

    /// Run the full aggregation.
    pub fn analyze(&self, records: &[CompletionRecord], now: NaiveDateTime) -> PatternData {
        let hourly_stats = self.hourly_stats(records);
        let daily_stats = self.daily_stats(records);
        let peak_hours = self.peak_hours(&hourly_stats);
        let best_days = self.best_days(&daily_stats);
        let weekly_trend = self.weekly_trend(records, now);

        tracing::debug!(
            total = records.len(),
            ?peak_hours,
            ?best_days,
            trend = weekly_trend.name(),
            "pattern analysis complete"
        );

        PatternData {
            hourly_stats,
            daily_stats,
            peak_hours,
            best_days,
            total_completions: records.len() as u64,
            weekly_trend,
        }
    }

    /// Bucket completions by hour. Always returns 24 entries.
    pub fn hourly_stats(&self, records: &[CompletionRecord]) -> Vec<HourlyStat> {
        let mut counts = [0u64; 24];
        let mut energy = [0f64; 24];
        for record in records {
            let hour = record.hour() as usize;
            counts[hour] += 1;
            energy[hour] += record.energy_level.weight();
        }

        let total = records.len() as f64;
        (0..24u8)
            .map(|hour| {
                let count = counts[hour as usize];
                HourlyStat {
                    hour,
                    completion_count: count,
                    average_energy: mean(energy[hour as usize], count),
                    success_rate: if total > 0.0 { count as f64 / total } else { 0.0 },
                }
            })
            .collect()
    }

    /// Bucket completions by weekday. Always returns 7 entries.
    pub fn daily_stats(&self, records: &[CompletionRecord]) -> Vec<DailyStat> {
        let mut counts = [0u64; 7];
        let mut energy = [0f64; 7];
        for record in records {
            let day = record.day_of_week() as usize;
            counts[day] += 1;
            energy[day] += record.energy_level.weight();
        }

        (0..7u8)
            .map(|day| DailyStat {
                day_of_week: day,
                completion_count: counts[day as usize],
                average_energy: mean(energy[day as usize], counts[day as usize]),
            })
            .collect()
    }

    /// Busiest hours first; ties keep the lower hour. Short lists are filled
    /// from the default peak hours.
    pub fn peak_hours(&self, stats: &[HourlyStat]) -> Vec<u8> {
        top_buckets(
            stats.iter().map(|s| (s.hour, s.completion_count)),
            &self.default_peak_hours,
            self.top_n,
        )
    }

    /// Busiest weekdays first, same rules as [`Self::peak_hours`].
    pub fn best_days(&self, stats: &[DailyStat]) -> Vec<u8> {
        top_buckets(
            stats.iter().map(|s| (s.day_of_week, s.completion_count)),
            &self.default_best_days,
            self.top_n,
        )
    }

    /// The `n` quietest hours within `within`, lowest hour first on ties.
    ///
    /// Empty when there are no completions at all; a blank history says
    /// nothing about which hours are unproductive.
    pub fn least_productive_hours(
        &self,
        stats: &[HourlyStat],
        within: Range<u8>,
        n: usize,
    ) -> Vec<u8> {
        if stats.iter().all(|s| s.completion_count == 0) {
            return Vec::new();
        }
        let mut candidates: Vec<&HourlyStat> =
            stats.iter().filter(|s| within.contains(&s.hour)).collect();
        candidates.sort_by(|a, b| a.completion_count.cmp(&b.completion_count));
        candidates.into_iter().take(n).map(|s| s.hour).collect()
    }

    /// Compare the trailing 7 days against the 7 days before them.
    pub fn weekly_trend(&self, records: &[CompletionRecord], now: NaiveDateTime) -> WeeklyTrend {
        let week_ago = now - Duration::days(7);
        let two_weeks_ago = now - Duration::days(14);

        let current = records
            .iter()
            .filter(|r| r.completed_at > week_ago && r.completed_at <= now)
            .count();
        let previous = records
            .iter()
            .filter(|r| r.completed_at > two_weeks_ago && r.completed_at <= week_ago)
            .count();

        if previous == 0 {
            return if current > 0 {
                WeeklyTrend::Improving
            } else {
                WeeklyTrend::Stable
            };
        }

        let ratio = current as f64 / previous as f64;
        if ratio > Self::IMPROVING_RATIO {
            WeeklyTrend::Improving
        } else if ratio < Self::DECLINING_RATIO {
            WeeklyTrend::Declining
        } else {
            WeeklyTrend::Stable
        }
    }

    /// Human-readable observations about a pattern.
    pub fn insights(&self, data: &PatternData) -> Vec<String> {
        let mut insights = Vec::new();

        if data.total_completions == 0 {
            insights.push(
                "No completed tasks yet. Finish a few and your patterns will show up here."
                    .to_string(),
            );
            return insights;
        }

        let hours: Vec<String> = data
            .peak_hours
            .iter()
            .filter(|h| data.completions_at(**h) > 0)
            .map(|h| format!("{:02}:00", h))
            .collect();
        if !hours.is_empty() {
            insights.push(format!("You get the most done around {}.", hours.join(", ")));
        }

        if let Some(day) = data
            .best_days
            .first()
            .filter(|d| data.daily_stats.get(**d as usize).map(|s| s.completion_count) > Some(0))
        {
            insights.push(format!("{} is your most productive day.", DAY_NAMES[*day as usize]));
        }

        insights.push(match data.weekly_trend {
            WeeklyTrend::Improving => "You finished more this week than last week.".to_string(),
            WeeklyTrend::Declining => {
                "This week is quieter than last week. Small steps still count.".to_string()
            }
            WeeklyTrend::Stable => "Your pace is steady compared to last week.".to_string(),
        });

        insights
    }
}

fn mean(sum: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Top `n` buckets by count, stable on ties, padded from `defaults`.
fn top_buckets(buckets: impl Iterator<Item = (u8, u64)>, defaults: &[u8], n: usize) -> Vec<u8> {
    let mut active: Vec<(u8, u64)> = buckets.filter(|(_, count)| *count > 0).collect();
    active.sort_by(|a, b| b.1.cmp(&a.1));

    let mut top: Vec<u8> = active.into_iter().take(n).map(|(bucket, _)| bucket).collect();
    for default in defaults {
        if top.len() >= n {
            break;
        }
        if !top.contains(default) {
            top.push(*default);
        }
    }
    top
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::EnergyLevel;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn completion(day: u32, hour: u32, energy: EnergyLevel) -> CompletionRecord {
        CompletionRecord::new("task", "Task", energy, at(day, hour))
    }

    #[test]
    fn empty_history_uses_defaults() {
        let analyzer = PatternAnalyzer::new();
        let data = analyzer.analyze(&[], at(20, 12));
        assert_eq!(data.peak_hours, vec![9, 10, 11]);
        assert_eq!(data.best_days, vec![1, 2, 3]);
        assert_eq!(data.weekly_trend, WeeklyTrend::Stable);
        assert_eq!(data.hourly_stats.len(), 24);
        assert_eq!(data.daily_stats.len(), 7);
    }

    #[test]
    fn peak_hours_rank_by_count_then_hour() {
        let analyzer = PatternAnalyzer::new();
        let mut records = Vec::new();
        for _ in 0..5 {
            records.push(completion(3, 10, EnergyLevel::High));
        }
        records.push(completion(3, 14, EnergyLevel::Low));

        let stats = analyzer.hourly_stats(&records);
        let peaks = analyzer.peak_hours(&stats);
        assert_eq!(peaks, vec![10, 14, 9]);
    }

    #[test]
    fn ties_keep_lower_hour_first() {
        let analyzer = PatternAnalyzer::new();
        let records = vec![
            completion(3, 16, EnergyLevel::Low),
            completion(3, 8, EnergyLevel::Low),
            completion(3, 12, EnergyLevel::Low),
            completion(3, 20, EnergyLevel::Low),
        ];
        let peaks = analyzer.peak_hours(&analyzer.hourly_stats(&records));
        assert_eq!(peaks, vec![8, 12, 16]);
    }

    #[test]
    fn hourly_average_energy_and_share() {
        let analyzer = PatternAnalyzer::new();
        let records = vec![
            completion(3, 9, EnergyLevel::High),
            completion(3, 9, EnergyLevel::Low),
            completion(3, 15, EnergyLevel::Medium),
            completion(3, 15, EnergyLevel::Medium),
        ];
        let stats = analyzer.hourly_stats(&records);
        assert_eq!(stats[9].completion_count, 2);
        assert!((stats[9].average_energy - 2.0).abs() < f64::EPSILON);
        assert!((stats[15].success_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats[0].average_energy, 0.0);
    }

    #[test]
    fn best_days_by_weekday() {
        let analyzer = PatternAnalyzer::new();
        // 2024-06-07 is a Friday, 2024-06-08 a Saturday
        let records = vec![
            completion(7, 9, EnergyLevel::Low),
            completion(7, 10, EnergyLevel::Low),
            completion(8, 10, EnergyLevel::Low),
        ];
        let days = analyzer.best_days(&analyzer.daily_stats(&records));
        assert_eq!(days, vec![5, 6, 1]);
    }

    #[test]
    fn trend_improving_declining_stable() {
        let analyzer = PatternAnalyzer::new();
        let now = at(20, 12);

        // 2 last week, 3 this week -> ratio 1.5
        let mut records = vec![
            completion(10, 9, EnergyLevel::Low),
            completion(11, 9, EnergyLevel::Low),
        ];
        records.extend((15..18).map(|d| completion(d, 9, EnergyLevel::Low)));
        assert_eq!(analyzer.weekly_trend(&records, now), WeeklyTrend::Improving);

        // 5 last week, 2 this week -> ratio 0.4
        let mut records: Vec<_> = (7..12).map(|d| completion(d, 9, EnergyLevel::Low)).collect();
        records.extend((15..17).map(|d| completion(d, 9, EnergyLevel::Low)));
        assert_eq!(analyzer.weekly_trend(&records, now), WeeklyTrend::Declining);

        // 5 vs 5
        let mut records: Vec<_> = (7..12).map(|d| completion(d, 9, EnergyLevel::Low)).collect();
        records.extend((14..19).map(|d| completion(d, 9, EnergyLevel::Low)));
        assert_eq!(analyzer.weekly_trend(&records, now), WeeklyTrend::Stable);
    }

    #[test]
    fn trend_from_zero_baseline_never_declines() {
        let analyzer = PatternAnalyzer::new();
        let now = at(20, 12);
        let records = vec![completion(19, 9, EnergyLevel::Low)];
        assert_eq!(analyzer.weekly_trend(&records, now), WeeklyTrend::Improving);
        assert_eq!(analyzer.weekly_trend(&[], now), WeeklyTrend::Stable);
    }

    #[test]
    fn least_productive_hours_need_history() {
        let analyzer = PatternAnalyzer::new();
        assert!(analyzer
            .least_productive_hours(&analyzer.hourly_stats(&[]), 9..18, 2)
            .is_empty());

        let mut records: Vec<_> = (9..18).map(|h| completion(3, h, EnergyLevel::Low)).collect();
        records.push(completion(4, 9, EnergyLevel::Low));
        records.push(completion(4, 10, EnergyLevel::Low));
        let stats = analyzer.hourly_stats(&records);
        assert_eq!(analyzer.least_productive_hours(&stats, 9..18, 2), vec![11, 12]);
    }

    #[test]
    fn insights_for_new_and_active_users() {
        let analyzer = PatternAnalyzer::new();
        let empty = analyzer.analyze(&[], at(20, 12));
        assert!(analyzer.insights(&empty)[0].contains("No completed tasks"));

        let records = vec![completion(19, 10, EnergyLevel::High)];
        let data = analyzer.analyze(&records, at(20, 12));
        let insights = analyzer.insights(&data);
        assert!(insights[0].contains("10:00"));
        assert!(insights.iter().any(|i| i.contains("Wednesday")));
    }
}
