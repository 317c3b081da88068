//! Execution layer - daily action budget and follow limit.

#![warn(missing_docs)]

pub mod ledger;
pub mod follow;

#[cfg(test)]
mod testing;

pub use ledger::{BudgetLedger, BudgetSummary};
pub use follow::FollowLimiter;
