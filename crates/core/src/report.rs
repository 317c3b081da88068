//! Weekly meta review report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::ReportId;
use crate::{ContentType, Platform, Time};

/// Direction of week-over-week performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Average score rose by more than the threshold
    Improving,
    /// Within the threshold either way
    Stable,
    /// Average score fell by more than the threshold
    Declining,
}

impl Trend {
    /// Stable storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Declining => "declining",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-platform slice of a weekly report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
    /// Scored posts on the platform this week
    pub posts: u32,
    /// Rounded average score
    pub avg_score: u32,
}

/// One run of the weekly meta review. Reports are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    /// Unique identifier
    pub id: ReportId,

    /// Start of the reviewed window
    pub week_start: Time,

    /// End of the reviewed window
    pub week_end: Time,

    /// Scored posts in the window
    pub total_posts: u32,

    /// Average score this week
    pub avg_score: f64,

    /// Average score the week before (equals `avg_score` when there was no data)
    pub last_week_avg: f64,

    /// Highest-scoring content type
    pub best_type: Option<ContentType>,

    /// Lowest-scoring content type
    pub worst_type: Option<ContentType>,

    /// Post count and average per platform
    pub platform_breakdown: BTreeMap<Platform, PlatformStats>,

    /// Week-over-week direction
    pub trend: Trend,

    /// When the review ran
    pub generated_at: Time,
}
