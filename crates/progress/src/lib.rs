//! Outcome tracking
//!
//! Engagement metrics for published posts and the one-time performance
//! score assigned once a post has matured.

#![warn(missing_docs)]

pub mod tracker;
pub mod scorer;

pub use tracker::{OutcomeTracker, BasicOutcomeTracker};
pub use scorer::{calculate_score, score_post, MetricScale, LINK_CLICKS, REACTIONS, REPLIES};
