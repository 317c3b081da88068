//! Store with switchable failures for exercising the error paths.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use cadence_core::{
    ActionId, ActionRecord, ContentTypeWeight, Day, FollowRecord, MetricsUpdate, PostFilter,
    PostId, PostRecord, WeeklyReport,
};
use cadence_storage::{MemoryStorage, Result, Storage, StorageError};

#[derive(Default)]
pub(crate) struct FlakyStorage {
    inner: MemoryStorage,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FlakyStorage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    pub(crate) fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    pub(crate) fn fail_deletes(&self, on: bool) {
        self.fail_deletes.store(on, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("store offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn insert_action(&self, record: &ActionRecord) -> Result<()> {
        Self::check(&self.fail_writes)?;
        self.inner.insert_action(record).await
    }

    async fn delete_action(&self, id: ActionId) -> Result<()> {
        Self::check(&self.fail_deletes)?;
        self.inner.delete_action(id).await
    }

    async fn list_actions_for_day(&self, day: Day) -> Result<Vec<ActionRecord>> {
        Self::check(&self.fail_reads)?;
        self.inner.list_actions_for_day(day).await
    }

    async fn insert_follow(&self, record: &FollowRecord) -> Result<()> {
        Self::check(&self.fail_writes)?;
        self.inner.insert_follow(record).await
    }

    async fn count_follows_for_day(&self, day: Day) -> Result<usize> {
        Self::check(&self.fail_reads)?;
        self.inner.count_follows_for_day(day).await
    }

    async fn insert_post(&self, post: &PostRecord) -> Result<()> {
        self.inner.insert_post(post).await
    }

    async fn load_post(&self, id: PostId) -> Result<Option<PostRecord>> {
        self.inner.load_post(id).await
    }

    async fn update_post_metrics(&self, id: PostId, update: &MetricsUpdate) -> Result<()> {
        self.inner.update_post_metrics(id, update).await
    }

    async fn set_performance_score(&self, id: PostId, score: u8) -> Result<bool> {
        self.inner.set_performance_score(id, score).await
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<PostRecord>> {
        self.inner.list_posts(filter).await
    }

    async fn load_weights(&self) -> Result<Vec<ContentTypeWeight>> {
        self.inner.load_weights().await
    }

    async fn save_weights(&self, weights: &[ContentTypeWeight]) -> Result<()> {
        self.inner.save_weights(weights).await
    }

    async fn append_report(&self, report: &WeeklyReport) -> Result<()> {
        self.inner.append_report(report).await
    }

    async fn list_reports(&self) -> Result<Vec<WeeklyReport>> {
        self.inner.list_reports().await
    }
}
