//! Evolution layer - adaptive content-type weighting.

#![warn(missing_docs, unused_crate_dependencies)]

mod optimizer;
mod metrics;
mod selector;

pub use optimizer::{
    adapt, adapt_with_rate, default_weights, renormalize, WeightAdjustment, WeightOptimizer,
    LEARNING_RATE,
};
pub use metrics::{ContentPerformance, PerformanceWindow};
pub use selector::{pick_weighted, AdaptiveWeighting};
