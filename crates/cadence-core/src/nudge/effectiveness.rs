//! Notification effectiveness from the audit trail.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{NotificationHistoryEntry, NudgeType};

/// Outcome counters for one bucket of notifications.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EngagementRates {
    pub sent: usize,
    pub acknowledged: usize,
    pub dismissed: usize,
    pub acted: usize,
}

impl EngagementRates {
    fn record(&mut self, entry: &NotificationHistoryEntry) {
        self.sent += 1;
        if entry.acknowledged_at.is_some() {
            self.acknowledged += 1;
        }
        if entry.dismissed {
            self.dismissed += 1;
        }
        if entry.action_taken {
            self.acted += 1;
        }
    }

    fn rate(&self, count: usize) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            count as f64 / self.sent as f64
        }
    }

    pub fn acknowledgement_rate(&self) -> f64 {
        self.rate(self.acknowledged)
    }

    pub fn dismissal_rate(&self) -> f64 {
        self.rate(self.dismissed)
    }

    pub fn action_rate(&self) -> f64 {
        self.rate(self.acted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeEffectiveness {
    pub nudge_type: NudgeType,
    pub rates: EngagementRates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourEffectiveness {
    pub hour: u8,
    pub rates: EngagementRates,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NudgeEffectiveness {
    pub overall: EngagementRates,
    pub by_type: Vec<TypeEffectiveness>,
    /// Only hours with at least one send
    pub by_hour: Vec<HourEffectiveness>,
}

impl NudgeEffectiveness {
    pub fn from_history(history: &[NotificationHistoryEntry]) -> Self {
        let mut overall = EngagementRates::default();
        let mut by_type: BTreeMap<NudgeType, EngagementRates> = BTreeMap::new();
        let mut by_hour: BTreeMap<u8, EngagementRates> = BTreeMap::new();

        for entry in history {
            overall.record(entry);
            by_type.entry(entry.nudge_type).or_default().record(entry);
            by_hour.entry(entry.sent_hour()).or_default().record(entry);
        }

        Self {
            overall,
            by_type: by_type
                .into_iter()
                .map(|(nudge_type, rates)| TypeEffectiveness { nudge_type, rates })
                .collect(),
            by_hour: by_hour
                .into_iter()
                .map(|(hour, rates)| HourEffectiveness { hour, rates })
                .collect(),
        }
    }

    /// Hour with the highest action rate, earliest on ties.
    pub fn most_responsive_hour(&self) -> Option<u8> {
        self.by_hour
            .iter()
            .filter(|h| h.rates.acted > 0)
            .fold(None::<&HourEffectiveness>, |best, h| match best {
                Some(b) if b.rates.action_rate() >= h.rates.action_rate() => Some(b),
                _ => Some(h),
            })
            .map(|h| h.hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 18)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn empty_history_reports_zero_rates() {
        let report = NudgeEffectiveness::from_history(&[]);
        assert_eq!(report.overall.sent, 0);
        assert_eq!(report.overall.action_rate(), 0.0);
        assert!(report.by_type.is_empty());
        assert_eq!(report.most_responsive_hour(), None);
    }

    #[test]
    fn rates_grouped_by_type_and_hour() {
        let mut acted = NotificationHistoryEntry::new(NudgeType::FocusReminder, at(9));
        acted.acknowledged_at = Some(at(9));
        acted.action_taken = true;
        let mut dismissed = NotificationHistoryEntry::new(NudgeType::FocusReminder, at(15));
        dismissed.dismissed = true;
        let plain = NotificationHistoryEntry::new(NudgeType::EnergyCheck, at(15));

        let report = NudgeEffectiveness::from_history(&[acted, dismissed, plain]);
        assert_eq!(report.overall.sent, 3);
        assert_eq!(report.by_type.len(), 2);

        let focus = &report.by_type[0];
        assert_eq!(focus.nudge_type, NudgeType::FocusReminder);
        assert_eq!(focus.rates.action_rate(), 0.5);
        assert_eq!(focus.rates.dismissal_rate(), 0.5);
        assert_eq!(focus.rates.acknowledgement_rate(), 0.5);

        assert_eq!(
            report.by_hour.iter().map(|h| h.hour).collect::<Vec<_>>(),
            vec![9, 15]
        );
        assert_eq!(report.most_responsive_hour(), Some(9));
    }
}
