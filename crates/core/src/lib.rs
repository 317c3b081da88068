//! Cadence core data models.
//!
//! This crate defines the records that flow between the budget ledger, the
//! outcome tracker, adaptive weighting and the weekly meta review, together
//! with the clock, cache and configuration types they share.

#![warn(missing_docs)]

// Core identities
mod id;

// Action ledger
mod action;
mod follow;

// Posts and their outcomes
mod post;
mod weight;
mod report;

// Ambient
mod clock;
mod cache;
mod config;

// Re-exports
pub use id::*;

pub use action::{ActionRecord, ActionType, BudgetSnapshot};
pub use follow::FollowRecord;
pub use post::{ContentType, MetricsUpdate, Platform, PostFilter, PostRecord};
pub use weight::{ContentTypeWeight, MAX_WEIGHT, MIN_WEIGHT, WEIGHT_TOTAL};
pub use report::{PlatformStats, Trend, WeeklyReport};

pub use clock::{Clock, ManualClock, SystemClock};
pub use cache::TtlCache;
pub use config::{
    BreakerConfig, BudgetConfig, CoreError, GovernorConfig, RetryConfig, ReviewConfig,
    ScoringConfig, WeightConfig,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;

/// UTC calendar day
pub type Day = chrono::NaiveDate;
