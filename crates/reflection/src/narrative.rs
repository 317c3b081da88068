//! Plain-text strategy summary fed back to content generation.

use std::fmt::Write;

use cadence_core::{Trend, WeeklyReport};

/// Render a report as a short strategy note.
pub fn strategy_narrative(report: &WeeklyReport) -> String {
    let mut out = String::new();

    let _ = write!(
        out,
        "Week ending {}: {} scored posts averaged {:.0} (previous week {:.0}), trend {}.",
        report.week_end.format("%Y-%m-%d"),
        report.total_posts,
        report.avg_score,
        report.last_week_avg,
        report.trend
    );

    match report.trend {
        Trend::Improving => out.push_str(" Keep the current mix."),
        Trend::Declining => out.push_str(" Engagement is slipping; shift the mix."),
        Trend::Stable => {}
    }

    match (report.best_type, report.worst_type) {
        (Some(best), Some(worst)) if best != worst => {
            let _ = write!(out, " Lean into {} content; ease off {} content.", best, worst);
        }
        (Some(best), _) => {
            let _ = write!(out, " Only {} content was scored.", best);
        }
        _ => {}
    }

    if !report.platform_breakdown.is_empty() {
        let parts: Vec<String> = report
            .platform_breakdown
            .iter()
            .map(|(platform, stats)| format!("{} {} posts avg {}", platform.as_str(), stats.posts, stats.avg_score))
            .collect();
        let _ = write!(out, " By platform: {}.", parts.join(", "));
    }

    out
}
