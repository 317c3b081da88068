//! Daily follow limit.

use std::sync::Arc;

use cadence_core::{Clock, FollowRecord, SystemClock};
use cadence_storage::Storage;
use tracing::{info, warn};

/// Caps follows per UTC day.
///
/// When the count cannot be read the limiter reports the limit as reached,
/// so a store outage stops following instead of allowing unlimited follows.
pub struct FollowLimiter<S: Storage> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    limit: u32,
}

impl<S: Storage> FollowLimiter<S> {
    /// Create a limiter with the default limit of 20 per day.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
            limit: cadence_core::BudgetConfig::default().daily_follow_limit,
        }
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the daily limit.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Follows recorded today, or the limit if the store cannot be read.
    pub async fn follows_today(&self) -> u32 {
        let today = self.clock.today();
        match self.storage.count_follows_for_day(today).await {
            Ok(count) => u32::try_from(count).unwrap_or(u32::MAX),
            Err(e) => {
                warn!("Failed to count follows for {}, assuming limit reached: {}", today, e);
                self.limit
            }
        }
    }

    /// Whether another follow is allowed today.
    pub async fn can_follow(&self) -> bool {
        self.follows_today().await < self.limit
    }

    /// Record a follow if the limit allows it. Returns whether it was recorded.
    pub async fn record_follow(&self, account: &str) -> bool {
        if !self.can_follow().await {
            info!("Daily follow limit of {} reached, skipping {}", self.limit, account);
            return false;
        }

        let record = FollowRecord::new(account, self.clock.now());
        match self.storage.insert_follow(&record).await {
            Ok(()) => {
                info!("Recorded follow of {}", account);
                true
            }
            Err(e) => {
                warn!("Failed to record follow of {}: {}", account, e);
                false
            }
        }
    }
}
