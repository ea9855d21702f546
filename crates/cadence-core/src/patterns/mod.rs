//! Behavioral pattern analysis.
//!
//! Aggregates completion history into hourly and weekday statistics and
//! measures how mood relates to energy and output.

mod analyzer;
mod correlation;

pub use analyzer::{DailyStat, HourlyStat, PatternAnalyzer, PatternData, WeeklyTrend};
pub use correlation::{Correlation, CorrelationEngine, CorrelationReport, CorrelationStrength};
