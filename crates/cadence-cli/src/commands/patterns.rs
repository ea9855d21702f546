use cadence_core::{CorrelationReport, PatternData};
use serde::Serialize;

use super::{day_name, CliResult, Context};

#[derive(Serialize)]
struct PatternsReport {
    patterns: PatternData,
    correlations: CorrelationReport,
    insights: Vec<String>,
}

pub async fn run(ctx: &Context) -> CliResult {
    let snapshot = ctx.engine.load_snapshot(ctx.now).await?;
    let patterns = ctx.engine.patterns(&snapshot, ctx.now);
    let report = PatternsReport {
        correlations: ctx.engine.correlations(&snapshot),
        insights: ctx.engine.insights(&patterns),
        patterns,
    };

    ctx.output(&report, |r| {
        let hours: Vec<String> = r
            .patterns
            .peak_hours
            .iter()
            .map(|h| format!("{h:02}:00"))
            .collect();
        let days: Vec<&str> = r.patterns.best_days.iter().map(|d| day_name(*d)).collect();
        println!("Completions:  {}", r.patterns.total_completions);
        println!("Peak hours:   {}", hours.join(", "));
        println!("Best days:    {}", days.join(", "));
        println!("Trend:        {}", r.patterns.weekly_trend.name());
        println!(
            "Mood/energy:  {} ({:.2}, {} samples)",
            r.correlations.mood_energy.strength.describe(),
            r.correlations.mood_energy.coefficient,
            r.correlations.mood_energy.samples
        );
        println!(
            "Mood/output:  {} ({:.2}, {} samples)",
            r.correlations.mood_productivity.strength.describe(),
            r.correlations.mood_productivity.coefficient,
            r.correlations.mood_productivity.samples
        );
        for insight in &r.insights {
            println!("- {insight}");
        }
    })
}
