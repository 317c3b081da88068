//! Score averages over a window of posts.

use std::collections::BTreeMap;

use cadence_core::{ContentType, PostRecord};
use serde::{Deserialize, Serialize};

/// Average score of one content type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentPerformance {
    /// Content type
    pub content_type: ContentType,
    /// Scored posts of this type
    pub posts: u32,
    /// Mean performance score
    pub avg_score: f64,
}

/// Per-type and overall averages of the scored posts in a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceWindow {
    /// Averages keyed by content type; types with no scored posts are absent
    pub by_type: BTreeMap<ContentType, ContentPerformance>,
    /// Mean over every scored post
    pub overall_avg: f64,
    /// Scored posts in the window
    pub total_posts: u32,
}

impl PerformanceWindow {
    /// Aggregate posts. Unscored posts are ignored.
    pub fn from_posts(posts: &[PostRecord]) -> Self {
        let mut sums: BTreeMap<ContentType, (u32, u64)> = BTreeMap::new();
        let mut total = 0u64;
        let mut count = 0u32;

        for post in posts {
            let Some(score) = post.performance_score else {
                continue;
            };
            let entry = sums.entry(post.content_type).or_default();
            entry.0 += 1;
            entry.1 += u64::from(score);
            total += u64::from(score);
            count += 1;
        }

        let by_type = sums
            .into_iter()
            .map(|(content_type, (posts, sum))| {
                let perf = ContentPerformance {
                    content_type,
                    posts,
                    avg_score: sum as f64 / f64::from(posts),
                };
                (content_type, perf)
            })
            .collect();

        Self {
            by_type,
            overall_avg: if count == 0 { 0.0 } else { total as f64 / f64::from(count) },
            total_posts: count,
        }
    }

    /// Whether no scored post fell in the window.
    pub fn is_empty(&self) -> bool {
        self.total_posts == 0
    }

    /// Type average minus the overall average.
    pub fn differential(&self, content_type: ContentType) -> Option<f64> {
        self.by_type
            .get(&content_type)
            .map(|perf| perf.avg_score - self.overall_avg)
    }

    /// Highest average. Ties go to the type listed first.
    pub fn best(&self) -> Option<ContentPerformance> {
        self.by_type.values().copied().fold(None, |best, perf| match best {
            Some(b) if b.avg_score >= perf.avg_score => Some(b),
            _ => Some(perf),
        })
    }

    /// Lowest average. Ties go to the type listed first.
    pub fn worst(&self) -> Option<ContentPerformance> {
        self.by_type.values().copied().fold(None, |worst, perf| match worst {
            Some(w) if w.avg_score <= perf.avg_score => Some(w),
            _ => Some(perf),
        })
    }
}
