//! Reflection layer - weekly meta review and strategy feedback.

#![warn(missing_docs, unused_crate_dependencies)]

mod engine;
mod analyzer;
mod archive;
mod narrative;

pub use engine::{MetaReviewer, ReviewError};
pub use analyzer::{average_score, classify_trend, looks_like_metrics_outage, platform_breakdown};
pub use archive::{ArchiveError, JsonArchive, NoopArchive, ReportArchive};
pub use narrative::strategy_narrative;
