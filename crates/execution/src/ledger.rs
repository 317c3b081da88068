//! Daily action budget.
//!
//! Admission is decided by [`BudgetLedger::record_action`], which commits
//! optimistically and compensates:
//!
//! ```text
//! insert row → re-read today's counts → over a cap? delete row → report
//! ```
//!
//! Two racing callers both observe the combined count on re-read, so an
//! over-cap day is always caught by whoever pushed it over. Under contention
//! both may roll back even though one would have fit; the ledger
//! under-admits rather than over-admits.

use std::sync::Arc;

use cadence_core::{ActionRecord, ActionType, BudgetConfig, BudgetSnapshot, Clock, Day, SystemClock};
use cadence_storage::Storage;
use tracing::{debug, error, info, warn};

/// Today's counts against both caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSummary {
    /// Day summarised
    pub day: Day,
    /// Counts for the day
    pub snapshot: BudgetSnapshot,
    /// Total cap
    pub daily_total: u32,
    /// Discretionary sub-cap
    pub discretionary_limit: u32,
    /// Discretionary actions left
    pub discretionary_remaining: u32,
}

impl std::fmt::Display for BudgetSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}/{} actions ({} scheduled, {}/{} discretionary), {} remaining",
            self.day,
            self.snapshot.total_count,
            self.daily_total,
            self.snapshot.scheduled_count,
            self.snapshot.discretionary_count,
            self.discretionary_limit,
            self.snapshot.remaining,
        )
    }
}

/// Gates and records the agent's daily actions.
pub struct BudgetLedger<S: Storage> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    config: BudgetConfig,
}

impl<S: Storage> BudgetLedger<S> {
    /// Create a ledger with the default caps (23 total, 10 discretionary).
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
            config: BudgetConfig::default(),
        }
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the caps.
    pub fn with_config(mut self, config: BudgetConfig) -> Self {
        self.config = config;
        self
    }

    async fn snapshot_for(&self, day: Day) -> cadence_storage::Result<BudgetSnapshot> {
        let records = self.storage.list_actions_for_day(day).await?;
        Ok(BudgetSnapshot::tally(&records, self.config.daily_total))
    }

    /// Whether `snapshot` breaks a cap that applies to `action_type`.
    fn over_budget(&self, snapshot: &BudgetSnapshot, action_type: ActionType) -> bool {
        snapshot.total_count > self.config.daily_total
            || (!action_type.is_scheduled()
                && snapshot.discretionary_count > self.config.discretionary)
    }

    /// Counts for the current UTC day. A failed read yields a zeroed snapshot.
    pub async fn get_today_actions(&self) -> BudgetSnapshot {
        let today = self.clock.today();
        match self.snapshot_for(today).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Failed to read action ledger for {}: {}", today, e);
                BudgetSnapshot::empty(self.config.daily_total)
            }
        }
    }

    /// Advisory pre-check. Not race-safe; [`record_action`](Self::record_action)
    /// is the real gate.
    pub async fn can_take_action(&self, action_type: ActionType) -> bool {
        let snapshot = self.get_today_actions().await;
        if snapshot.total_count >= self.config.daily_total {
            return false;
        }
        if !action_type.is_scheduled() && snapshot.discretionary_count >= self.config.discretionary {
            return false;
        }
        true
    }

    /// Commit an action against today's budget.
    ///
    /// Returns `true` only if the inserted row survived verification. A
    /// `false` means the action must not be taken; it is not an error.
    pub async fn record_action(
        &self,
        action_type: ActionType,
        description: &str,
        external_ref: Option<&str>,
    ) -> bool {
        let record = ActionRecord::new(
            action_type,
            description,
            external_ref.map(str::to_string),
            self.clock.now(),
        );

        if let Err(e) = self.storage.insert_action(&record).await {
            error!("Failed to record {} action: {}", action_type, e);
            return false;
        }

        // Verify against the day stamped on the row, not a fresh "today".
        let over = match self.snapshot_for(record.day).await {
            Ok(snapshot) => {
                let over = self.over_budget(&snapshot, action_type);
                debug!(
                    action = %action_type,
                    total = snapshot.total_count,
                    discretionary = snapshot.discretionary_count,
                    over,
                    "Verified action against budget"
                );
                over
            }
            Err(e) => {
                warn!("Could not verify {} action {}, rolling back: {}", action_type, record.id, e);
                true
            }
        };

        if !over {
            info!("Recorded {} action {}: {}", action_type, record.id, description);
            return true;
        }

        if let Err(e) = self.storage.delete_action(record.id).await {
            // The orphan stays on its own day and is counted by later reads.
            error!("Failed to roll back over-budget action {}: {}", record.id, e);
        } else {
            info!("Budget exhausted, rolled back {} action {}", action_type, record.id);
        }
        false
    }

    /// Discretionary actions left today.
    pub async fn get_discretionary_remaining(&self) -> u32 {
        let snapshot = self.get_today_actions().await;
        self.config.discretionary.saturating_sub(snapshot.discretionary_count)
    }

    /// Today's counts against both caps.
    pub async fn get_budget_summary(&self) -> BudgetSummary {
        let snapshot = self.get_today_actions().await;
        BudgetSummary {
            day: self.clock.today(),
            discretionary_remaining: self
                .config
                .discretionary
                .saturating_sub(snapshot.discretionary_count),
            daily_total: self.config.daily_total,
            discretionary_limit: self.config.discretionary,
            snapshot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FlakyStorage;
    use cadence_core::ManualClock;
    use cadence_storage::MemoryStorage;
    use chrono::TimeZone;
    use std::time::Duration;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            chrono::Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap(),
        ))
    }

    fn ledger(storage: Arc<MemoryStorage>, clock: Arc<ManualClock>) -> BudgetLedger<MemoryStorage> {
        BudgetLedger::new(storage).with_clock(clock)
    }

    #[tokio::test]
    async fn test_sequential_admits_exactly_total_budget() {
        let storage = Arc::new(MemoryStorage::new());
        let ledger = ledger(storage.clone(), clock());

        for i in 0..23 {
            assert!(ledger.record_action(ActionType::ScheduledPost, &format!("post {}", i), None).await);
        }
        assert!(!ledger.record_action(ActionType::ScheduledPost, "one too many", None).await);
        assert_eq!(storage.action_count().await, 23);
        assert!(!ledger.can_take_action(ActionType::ScheduledPost).await);
    }

    #[tokio::test]
    async fn test_discretionary_sub_cap() {
        let storage = Arc::new(MemoryStorage::new());
        let ledger = ledger(storage.clone(), clock());

        for _ in 0..10 {
            assert!(ledger.record_action(ActionType::Reply, "reply", None).await);
        }
        assert_eq!(ledger.get_discretionary_remaining().await, 0);
        assert!(!ledger.can_take_action(ActionType::Like).await);
        assert!(!ledger.record_action(ActionType::Like, "like", None).await);
        assert_eq!(storage.action_count().await, 10);
    }

    #[tokio::test]
    async fn test_scheduled_exempt_from_discretionary_cap() {
        let storage = Arc::new(MemoryStorage::new());
        let ledger = ledger(storage.clone(), clock());

        for _ in 0..10 {
            assert!(ledger.record_action(ActionType::QuotePost, "quote", None).await);
        }
        assert!(ledger.can_take_action(ActionType::ScheduledPost).await);
        for _ in 0..13 {
            assert!(ledger.record_action(ActionType::ScheduledPost, "scheduled", None).await);
        }
        assert!(!ledger.record_action(ActionType::ScheduledPost, "scheduled", None).await);

        let snapshot = ledger.get_today_actions().await;
        assert_eq!(snapshot.total_count, 23);
        assert_eq!(snapshot.remaining, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simultaneous_burst_rolls_back_without_overshoot() {
        let storage = Arc::new(MemoryStorage::new().with_latency(Duration::from_millis(20)));
        let ledger = ledger(storage.clone(), clock());

        // Every racer inserts before any verifies, so each sees 40 rows.
        let attempts = (0..40).map(|i| {
            let ledger = &ledger;
            async move {
                ledger
                    .record_action(ActionType::ScheduledPost, &format!("burst {}", i), None)
                    .await
            }
        });
        let results = futures::future::join_all(attempts).await;

        let admitted = results.iter().filter(|ok| **ok).count();
        assert_eq!(admitted, 0);
        assert_eq!(storage.action_count().await, 0);
    }

    /// Fill the day through a latency-free handle on the same tables, then
    /// race `racers` callers arriving `gap` apart over a slow handle.
    async fn staggered_race(
        prefill: &[ActionType],
        racers: usize,
        racer_type: ActionType,
        gap: Duration,
    ) -> (usize, BudgetSnapshot) {
        let fast = MemoryStorage::new();
        let slow = Arc::new(fast.clone().with_latency(Duration::from_millis(20)));
        let clock = clock();

        let filler = ledger(Arc::new(fast), clock.clone());
        for &action_type in prefill {
            assert!(filler.record_action(action_type, "prefill", None).await);
        }

        let racing = ledger(slow, clock);
        let attempts = (0..racers).map(|i| {
            let racing = &racing;
            async move {
                tokio::time::sleep(gap * i as u32).await;
                racing.record_action(racer_type, &format!("racer {}", i), None).await
            }
        });
        let results = futures::future::join_all(attempts).await;
        let admitted = results.iter().filter(|ok| **ok).count();

        (admitted, filler.get_today_actions().await)
    }

    #[tokio::test(start_paused = true)]
    async fn test_staggered_race_fills_remaining_budget_without_overshoot() {
        let prefill = vec![ActionType::ScheduledPost; 20];
        let (admitted, snapshot) =
            staggered_race(&prefill, 10, ActionType::ScheduledPost, Duration::from_millis(15)).await;

        assert!(admitted > 0, "no racer was admitted");
        assert!((20..=23).contains(&snapshot.total_count), "total {}", snapshot.total_count);
        assert_eq!(admitted as u32, snapshot.total_count - 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_staggered_race_respects_discretionary_cap() {
        let prefill = vec![ActionType::Reply; 8];
        let (admitted, snapshot) =
            staggered_race(&prefill, 10, ActionType::Like, Duration::from_millis(15)).await;

        assert!(admitted > 0, "no racer was admitted");
        assert!(snapshot.discretionary_count <= 10, "discretionary {}", snapshot.discretionary_count);
        assert_eq!(admitted as u32, snapshot.discretionary_count - 8);
        assert_eq!(snapshot.total_count, snapshot.discretionary_count);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_arrivals_admit_exactly_the_remaining_budget() {
        // Each call finishes before the next arrives.
        let prefill = vec![ActionType::ScheduledPost; 18];
        let (admitted, snapshot) =
            staggered_race(&prefill, 10, ActionType::ScheduledPost, Duration::from_millis(100)).await;

        assert_eq!(admitted, 5);
        assert_eq!(snapshot.total_count, 23);
    }

    #[tokio::test]
    async fn test_day_rolls_over() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = clock();
        let ledger = ledger(storage.clone(), clock.clone());

        for _ in 0..10 {
            assert!(ledger.record_action(ActionType::Like, "like", None).await);
        }
        assert!(!ledger.can_take_action(ActionType::Like).await);

        clock.advance(chrono::Duration::days(1));
        assert!(ledger.can_take_action(ActionType::Like).await);
        assert_eq!(ledger.get_today_actions().await.total_count, 0);
    }

    #[tokio::test]
    async fn test_read_failure_yields_zeroed_snapshot() {
        let storage = Arc::new(FlakyStorage::new());
        storage.fail_reads(true);
        let ledger = BudgetLedger::new(storage).with_clock(clock());

        let snapshot = ledger.get_today_actions().await;
        assert_eq!(snapshot, BudgetSnapshot::empty(23));
    }

    #[tokio::test]
    async fn test_insert_failure_rejects() {
        let storage = Arc::new(FlakyStorage::new());
        storage.fail_writes(true);
        let ledger = BudgetLedger::new(storage.clone()).with_clock(clock());

        assert!(!ledger.record_action(ActionType::Reply, "reply", None).await);
        storage.fail_writes(false);
        assert_eq!(ledger.get_today_actions().await.total_count, 0);
    }

    #[tokio::test]
    async fn test_unverifiable_insert_is_rolled_back() {
        let storage = Arc::new(FlakyStorage::new());
        storage.fail_reads(true);
        let ledger = BudgetLedger::new(storage.clone()).with_clock(clock());

        assert!(!ledger.record_action(ActionType::Reply, "reply", None).await);
        storage.fail_reads(false);
        assert_eq!(ledger.get_today_actions().await.total_count, 0);
    }

    #[tokio::test]
    async fn test_failed_rollback_leaves_orphan() {
        let storage = Arc::new(FlakyStorage::new());
        let ledger = BudgetLedger::new(storage.clone())
            .with_clock(clock())
            .with_config(BudgetConfig { daily_total: 1, ..Default::default() });

        assert!(ledger.record_action(ActionType::ScheduledPost, "first", None).await);
        storage.fail_deletes(true);
        assert!(!ledger.record_action(ActionType::ScheduledPost, "second", None).await);

        // The orphan still counts.
        assert_eq!(ledger.get_today_actions().await.total_count, 2);
    }

    #[tokio::test]
    async fn test_summary_renders() {
        let storage = Arc::new(MemoryStorage::new());
        let ledger = ledger(storage, clock());
        ledger.record_action(ActionType::ScheduledPost, "post", Some("at://post/1")).await;
        ledger.record_action(ActionType::Reply, "reply", None).await;

        let summary = ledger.get_budget_summary().await;
        assert_eq!(summary.discretionary_remaining, 9);
        assert_eq!(
            summary.to_string(),
            "2026-05-04: 2/23 actions (1 scheduled, 1/10 discretionary), 21 remaining"
        );
    }
}
