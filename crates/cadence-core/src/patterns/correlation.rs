//! Linear correlation between mood, energy and productivity.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::history::{CompletionRecord, MoodEntry};

/// Qualitative reading of a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    StrongPositive,
    ModeratePositive,
    Neutral,
    ModerateNegative,
    StrongNegative,
}

impl CorrelationStrength {
    pub fn from_coefficient(r: f64) -> Self {
        if r > 0.5 {
            CorrelationStrength::StrongPositive
        } else if r > 0.2 {
            CorrelationStrength::ModeratePositive
        } else if r > -0.2 {
            CorrelationStrength::Neutral
        } else if r > -0.5 {
            CorrelationStrength::ModerateNegative
        } else {
            CorrelationStrength::StrongNegative
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            CorrelationStrength::StrongPositive => "strong positive",
            CorrelationStrength::ModeratePositive => "moderate positive",
            CorrelationStrength::Neutral => "neutral",
            CorrelationStrength::ModerateNegative => "moderate negative",
            CorrelationStrength::StrongNegative => "strong negative",
        }
    }
}

/// A coefficient with its label and the number of pairs behind it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub coefficient: f64,
    pub strength: CorrelationStrength,
    pub samples: usize,
}

impl Correlation {
    fn new(coefficient: f64, samples: usize) -> Self {
        Self {
            coefficient,
            strength: CorrelationStrength::from_coefficient(coefficient),
            samples,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub mood_energy: Correlation,
    pub mood_productivity: Correlation,
}

/// Pearson correlation over paired series.
#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    /// Fewer pairs than this yields 0
    pub min_samples: usize,
    /// How far after a mood entry completions are counted
    pub productivity_window: Duration,
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationEngine {
    pub fn new() -> Self {
        Self {
            min_samples: 5,
            productivity_window: Duration::hours(2),
        }
    }

    /// Pearson's r over the pairs `xs[i], ys[i]`.
    ///
    /// Extra elements of the longer series are ignored. Returns 0 for fewer
    /// than `min_samples` pairs or when either series is constant.
    pub fn pearson(&self, xs: &[f64], ys: &[f64]) -> f64 {
        let n = xs.len().min(ys.len());
        if n < self.min_samples {
            return 0.0;
        }
        let xs = &xs[..n];
        let ys = &ys[..n];

        let mean_x = xs.iter().sum::<f64>() / n as f64;
        let mean_y = ys.iter().sum::<f64>() / n as f64;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for (x, y) in xs.iter().zip(ys) {
            let dx = x - mean_x;
            let dy = y - mean_y;
            cov += dx * dy;
            var_x += dx * dx;
            var_y += dy * dy;
        }

        let denom = (var_x * var_y).sqrt();
        if denom == 0.0 || !denom.is_finite() {
            return 0.0;
        }
        (cov / denom).clamp(-1.0, 1.0)
    }

    /// Mood against the energy tag carried by the same entry.
    pub fn mood_energy(&self, moods: &[MoodEntry]) -> Correlation {
        let (xs, ys): (Vec<f64>, Vec<f64>) = moods
            .iter()
            .filter_map(|m| m.energy.map(|e| (m.mood.value(), e.weight())))
            .unzip();
        Correlation::new(self.pearson(&xs, &ys), xs.len())
    }

    /// Mood against the number of completions in the window that follows it.
    pub fn mood_productivity(
        &self,
        moods: &[MoodEntry],
        completions: &[CompletionRecord],
    ) -> Correlation {
        let (xs, ys): (Vec<f64>, Vec<f64>) = moods
            .iter()
            .map(|m| {
                let until = m.timestamp + self.productivity_window;
                let count = completions
                    .iter()
                    .filter(|c| c.completed_at > m.timestamp && c.completed_at <= until)
                    .count();
                (m.mood.value(), count as f64)
            })
            .unzip();
        Correlation::new(self.pearson(&xs, &ys), xs.len())
    }

    pub fn report(&self, moods: &[MoodEntry], completions: &[CompletionRecord]) -> CorrelationReport {
        CorrelationReport {
            mood_energy: self.mood_energy(moods),
            mood_productivity: self.mood_productivity(moods, completions),
        }
    }
}
