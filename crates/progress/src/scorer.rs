//! Engagement scoring.
//!
//! Each metric is compressed on a log2 scale and saturates at 1.0:
//!
//! | metric      | divisor | saturates near | weight |
//! |-------------|---------|----------------|--------|
//! | reactions   | 5       | 32             | 0.4    |
//! | replies     | 4       | 16             | 0.4    |
//! | link clicks | 6       | 64             | 0.2    |

use cadence_core::PostRecord;

/// Log2 divisor and weight for one metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricScale {
    /// log2(x + 1) at which the metric saturates
    pub saturation: f64,
    /// Share of the composite score
    pub weight: f64,
}

impl MetricScale {
    /// Normalized contribution in [0, 1] before weighting.
    pub fn normalize(&self, value: u32) -> f64 {
        ((f64::from(value) + 1.0).log2() / self.saturation).min(1.0)
    }
}

/// Reactions scale.
pub const REACTIONS: MetricScale = MetricScale { saturation: 5.0, weight: 0.4 };

/// Replies scale.
pub const REPLIES: MetricScale = MetricScale { saturation: 4.0, weight: 0.4 };

/// Link clicks scale.
pub const LINK_CLICKS: MetricScale = MetricScale { saturation: 6.0, weight: 0.2 };

/// Composite 0-100 score. Monotonic in each argument; all zeros score 0.
pub fn calculate_score(reactions: u32, replies: u32, link_clicks: u32) -> u8 {
    let composite = REACTIONS.weight * REACTIONS.normalize(reactions)
        + REPLIES.weight * REPLIES.normalize(replies)
        + LINK_CLICKS.weight * LINK_CLICKS.normalize(link_clicks);
    (composite * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Score a post, counting unset metrics as zero.
pub fn score_post(post: &PostRecord) -> u8 {
    calculate_score(
        post.reactions.unwrap_or(0),
        post.replies.unwrap_or(0),
        post.link_clicks.unwrap_or(0),
    )
}
