//! Analyzes a week of scored posts.

use std::collections::BTreeMap;

use cadence_core::{Platform, PlatformStats, PostRecord, Trend};

/// Trend for a week-over-week score difference. Strictly beyond the
/// threshold counts; exactly at it is stable.
pub fn classify_trend(diff: f64, threshold: f64) -> Trend {
    if diff > threshold {
        Trend::Improving
    } else if diff < -threshold {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Mean performance score of the scored posts, if any.
pub fn average_score(posts: &[PostRecord]) -> Option<f64> {
    let scores: Vec<u8> = posts.iter().filter_map(|p| p.performance_score).collect();
    if scores.is_empty() {
        return None;
    }
    let sum: u64 = scores.iter().map(|&s| u64::from(s)).sum();
    Some(sum as f64 / scores.len() as f64)
}

/// Whether every post shows zero reactions and zero replies, which points
/// at a metrics collection outage rather than a bad week.
pub fn looks_like_metrics_outage(posts: &[PostRecord]) -> bool {
    !posts.is_empty() && posts.iter().all(PostRecord::has_no_engagement)
}

/// Post count and rounded average score per platform.
pub fn platform_breakdown(posts: &[PostRecord]) -> BTreeMap<Platform, PlatformStats> {
    let mut sums: BTreeMap<Platform, (u32, u64)> = BTreeMap::new();
    for post in posts {
        if let Some(score) = post.performance_score {
            let entry = sums.entry(post.platform).or_default();
            entry.0 += 1;
            entry.1 += u64::from(score);
        }
    }

    sums.into_iter()
        .map(|(platform, (count, sum))| {
            let avg = (sum as f64 / f64::from(count)).round() as u32;
            (platform, PlatformStats { posts: count, avg_score: avg })
        })
        .collect()
}
