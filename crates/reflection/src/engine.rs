//! Meta review engine - weekly performance summary.

use std::sync::Arc;

use cadence_core::{Clock, PostFilter, ReportId, ReviewConfig, SystemClock, WeeklyReport};
use cadence_evolution::PerformanceWindow;
use cadence_storage::Storage;
use tracing::{info, warn};

use crate::analyzer::{average_score, classify_trend, looks_like_metrics_outage, platform_breakdown};
use crate::ReportArchive;

/// Meta review errors.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// The store failed while persisting the report
    #[error("storage error: {0}")]
    Storage(#[from] cadence_storage::StorageError),
}

/// Summarizes the trailing week of scored posts.
pub struct MetaReviewer<S: Storage, A: ReportArchive> {
    storage: Arc<S>,
    archive: Arc<A>,
    clock: Arc<dyn Clock>,
    config: ReviewConfig,
}

impl<S: Storage, A: ReportArchive + 'static> MetaReviewer<S, A> {
    /// Create a reviewer.
    pub fn new(storage: Arc<S>, archive: Arc<A>) -> Self {
        Self {
            storage,
            archive,
            clock: Arc::new(SystemClock),
            config: ReviewConfig::default(),
        }
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: ReviewConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the review over the last 7 days.
    ///
    /// Returns `None` when the posts cannot be read, when there are too few
    /// scored posts, or when every post reads zero engagement. A produced
    /// report is persisted, then mirrored to the archive in the background.
    /// Only a failure to persist the report is an error.
    pub async fn run_meta_review(&self) -> Result<Option<WeeklyReport>, ReviewError> {
        let now = self.clock.now();
        let week_start = now - chrono::Duration::days(7);
        let prev_start = now - chrono::Duration::days(14);

        let Some(this_week) = self.scored_between(week_start, now).await else {
            return Ok(None);
        };
        if this_week.len() < self.config.min_posts as usize {
            info!(
                "Skipping meta review: {} scored post(s) this week, need {}",
                this_week.len(),
                self.config.min_posts
            );
            return Ok(None);
        }
        if looks_like_metrics_outage(&this_week) {
            warn!(
                "Skipping meta review: all {} scored posts show zero engagement, suspected metrics outage",
                this_week.len()
            );
            return Ok(None);
        }

        // The boundary instant belongs to this week only.
        let Some(last_week) = self.scored_between(prev_start, week_start).await else {
            return Ok(None);
        };
        let last_week: Vec<_> = last_week
            .into_iter()
            .filter(|p| p.posted_at < week_start)
            .collect();

        let avg_score = average_score(&this_week).unwrap_or(0.0);
        let last_week_avg = average_score(&last_week).unwrap_or(avg_score);
        let trend = classify_trend(avg_score - last_week_avg, self.config.trend_threshold);
        let window = PerformanceWindow::from_posts(&this_week);

        let report = WeeklyReport {
            id: ReportId::new(),
            week_start,
            week_end: now,
            total_posts: this_week.len() as u32,
            avg_score,
            last_week_avg,
            best_type: window.best().map(|p| p.content_type),
            worst_type: window.worst().map(|p| p.content_type),
            platform_breakdown: platform_breakdown(&this_week),
            trend,
            generated_at: now,
        };

        self.storage.append_report(&report).await?;
        info!(
            "Meta review {}: {} posts, avg {:.1} vs {:.1}, {}",
            report.id, report.total_posts, report.avg_score, report.last_week_avg, report.trend
        );

        let archive = self.archive.clone();
        let archived = report.clone();
        tokio::spawn(async move {
            if let Err(e) = archive.archive(&archived).await {
                warn!("Failed to archive report {}: {}", archived.id, e);
            }
        });

        Ok(Some(report))
    }

    async fn scored_between(
        &self,
        from: cadence_core::Time,
        until: cadence_core::Time,
    ) -> Option<Vec<cadence_core::PostRecord>> {
        let filter = PostFilter {
            scored: Some(true),
            posted_from: Some(from),
            posted_until: Some(until),
            ..Default::default()
        };
        match self.storage.list_posts(&filter).await {
            Ok(posts) => Some(posts),
            Err(e) => {
                warn!("Skipping meta review: could not read scored posts: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use cadence_core::{
        ActionId, ActionRecord, ContentType, ContentTypeWeight, Day, FollowRecord, ManualClock,
        MetricsUpdate, Platform, PostId, PostRecord, Time, Trend,
    };
    use cadence_storage::{MemoryStorage, StorageError};

    use crate::{ArchiveError, NoopArchive};

    #[derive(Default)]
    struct RecordingArchive {
        reports: Mutex<Vec<WeeklyReport>>,
        fail: bool,
    }

    #[async_trait]
    impl ReportArchive for RecordingArchive {
        async fn archive(&self, report: &WeeklyReport) -> Result<(), ArchiveError> {
            if self.fail {
                return Err(ArchiveError::Io(std::io::Error::new(std::io::ErrorKind::Other, "bucket gone")));
            }
            self.reports.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    /// Memory store whose post reads or report appends can be switched off.
    #[derive(Default)]
    struct OfflineStorage {
        inner: MemoryStorage,
        posts_offline: AtomicBool,
        reports_offline: AtomicBool,
    }

    impl OfflineStorage {
        fn check(flag: &AtomicBool) -> cadence_storage::Result<()> {
            if flag.load(Ordering::SeqCst) {
                Err(StorageError::Unavailable("store offline".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl Storage for OfflineStorage {
        async fn insert_action(&self, record: &ActionRecord) -> cadence_storage::Result<()> {
            self.inner.insert_action(record).await
        }

        async fn delete_action(&self, id: ActionId) -> cadence_storage::Result<()> {
            self.inner.delete_action(id).await
        }

        async fn list_actions_for_day(&self, day: Day) -> cadence_storage::Result<Vec<ActionRecord>> {
            self.inner.list_actions_for_day(day).await
        }

        async fn insert_follow(&self, record: &FollowRecord) -> cadence_storage::Result<()> {
            self.inner.insert_follow(record).await
        }

        async fn count_follows_for_day(&self, day: Day) -> cadence_storage::Result<usize> {
            self.inner.count_follows_for_day(day).await
        }

        async fn insert_post(&self, post: &PostRecord) -> cadence_storage::Result<()> {
            self.inner.insert_post(post).await
        }

        async fn load_post(&self, id: PostId) -> cadence_storage::Result<Option<PostRecord>> {
            self.inner.load_post(id).await
        }

        async fn update_post_metrics(&self, id: PostId, update: &MetricsUpdate) -> cadence_storage::Result<()> {
            self.inner.update_post_metrics(id, update).await
        }

        async fn set_performance_score(&self, id: PostId, score: u8) -> cadence_storage::Result<bool> {
            self.inner.set_performance_score(id, score).await
        }

        async fn list_posts(&self, filter: &PostFilter) -> cadence_storage::Result<Vec<PostRecord>> {
            Self::check(&self.posts_offline)?;
            self.inner.list_posts(filter).await
        }

        async fn load_weights(&self) -> cadence_storage::Result<Vec<ContentTypeWeight>> {
            self.inner.load_weights().await
        }

        async fn save_weights(&self, weights: &[ContentTypeWeight]) -> cadence_storage::Result<()> {
            self.inner.save_weights(weights).await
        }

        async fn append_report(&self, report: &WeeklyReport) -> cadence_storage::Result<()> {
            Self::check(&self.reports_offline)?;
            self.inner.append_report(report).await
        }

        async fn list_reports(&self) -> cadence_storage::Result<Vec<WeeklyReport>> {
            self.inner.list_reports().await
        }
    }

    struct Fixture {
        storage: Arc<MemoryStorage>,
        clock: Arc<ManualClock>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                storage: Arc::new(MemoryStorage::new()),
                clock: Arc::new(ManualClock::new(chrono::Utc::now())),
            }
        }

        fn reviewer<A: ReportArchive + 'static>(&self, archive: Arc<A>) -> MetaReviewer<MemoryStorage, A> {
            MetaReviewer::new(self.storage.clone(), archive).with_clock(self.clock.clone())
        }

        fn days_ago(&self, days: i64) -> Time {
            self.clock.now() - chrono::Duration::days(days)
        }

        async fn post(&self, content_type: ContentType, platform: Platform, score: u8, replies: u32, at: Time) {
            let mut post = PostRecord::new(content_type, platform, "plain", "topic", at);
            post.replies = Some(replies);
            post.performance_score = Some(score);
            self.storage.insert_post(&post).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_volume_gate() {
        let fx = Fixture::new();
        fx.post(ContentType::Insight, Platform::Twitter, 50, 2, fx.days_ago(1)).await;
        fx.post(ContentType::Insight, Platform::Twitter, 60, 2, fx.days_ago(2)).await;
        // Too old to count.
        fx.post(ContentType::Insight, Platform::Twitter, 60, 2, fx.days_ago(9)).await;

        let reviewer = fx.reviewer(Arc::new(NoopArchive));
        assert!(reviewer.run_meta_review().await.unwrap().is_none());
        assert!(fx.storage.list_reports().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_engagement_gate() {
        let fx = Fixture::new();
        for d in 1..=4 {
            fx.post(ContentType::Meme, Platform::Bluesky, 0, 0, fx.days_ago(d)).await;
        }

        let reviewer = fx.reviewer(Arc::new(NoopArchive));
        assert!(reviewer.run_meta_review().await.unwrap().is_none());
        assert!(fx.storage.list_reports().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_contents() {
        let fx = Fixture::new();
        fx.post(ContentType::Tutorial, Platform::Twitter, 70, 3, fx.days_ago(1)).await;
        fx.post(ContentType::Tutorial, Platform::Bluesky, 60, 1, fx.days_ago(2)).await;
        fx.post(ContentType::Meme, Platform::Twitter, 20, 0, fx.days_ago(3)).await;
        fx.post(ContentType::Question, Platform::Twitter, 50, 5, fx.days_ago(4)).await;
        fx.post(ContentType::Thread, Platform::Mastodon, 40, 1, fx.days_ago(10)).await;
        fx.post(ContentType::Thread, Platform::Mastodon, 30, 1, fx.days_ago(12)).await;

        let archive = Arc::new(RecordingArchive::default());
        let reviewer = fx.reviewer(archive.clone());
        let report = reviewer.run_meta_review().await.unwrap().unwrap();

        assert_eq!(report.total_posts, 4);
        assert_eq!(report.avg_score, 50.0);
        assert_eq!(report.last_week_avg, 35.0);
        assert_eq!(report.trend, Trend::Improving);
        assert_eq!(report.best_type, Some(ContentType::Tutorial));
        assert_eq!(report.worst_type, Some(ContentType::Meme));
        assert_eq!(report.platform_breakdown[&Platform::Twitter].posts, 3);
        assert_eq!(report.platform_breakdown[&Platform::Twitter].avg_score, 47);
        assert_eq!(report.platform_breakdown[&Platform::Bluesky].avg_score, 60);
        assert!(!report.platform_breakdown.contains_key(&Platform::Mastodon));

        assert_eq!(fx.storage.list_reports().await.unwrap(), vec![report.clone()]);

        for _ in 0..10 {
            if !archive.reports.lock().unwrap().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(archive.reports.lock().unwrap().clone(), vec![report]);
    }

    #[tokio::test]
    async fn test_no_last_week_data_is_stable() {
        let fx = Fixture::new();
        for (d, score) in [(1, 90u8), (2, 80), (3, 85)] {
            fx.post(ContentType::Insight, Platform::Linkedin, score, 4, fx.days_ago(d)).await;
        }

        let reviewer = fx.reviewer(Arc::new(NoopArchive));
        let report = reviewer.run_meta_review().await.unwrap().unwrap();
        assert_eq!(report.last_week_avg, report.avg_score);
        assert_eq!(report.trend, Trend::Stable);
        assert_eq!(report.best_type, report.worst_type);
    }

    #[tokio::test]
    async fn test_declining_trend() {
        let fx = Fixture::new();
        for d in 1..=3 {
            fx.post(ContentType::Insight, Platform::Twitter, 40, 1, fx.days_ago(d)).await;
        }
        for d in 8..=10 {
            fx.post(ContentType::Insight, Platform::Twitter, 44, 1, fx.days_ago(d)).await;
        }

        let reviewer = fx.reviewer(Arc::new(NoopArchive));
        let report = reviewer.run_meta_review().await.unwrap().unwrap();
        assert_eq!(report.trend, Trend::Declining);
    }

    #[tokio::test]
    async fn test_archive_failure_still_returns_report() {
        let fx = Fixture::new();
        for d in 1..=3 {
            fx.post(ContentType::Announcement, Platform::Twitter, 30, 2, fx.days_ago(d)).await;
        }

        let archive = Arc::new(RecordingArchive { fail: true, ..Default::default() });
        let reviewer = fx.reviewer(archive);
        let report = reviewer.run_meta_review().await.unwrap();
        assert!(report.is_some());
        assert_eq!(fx.storage.list_reports().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_min_posts_configurable() {
        let fx = Fixture::new();
        fx.post(ContentType::Insight, Platform::Twitter, 50, 2, fx.days_ago(1)).await;

        let reviewer = fx
            .reviewer(Arc::new(NoopArchive))
            .with_config(ReviewConfig { min_posts: 1, ..Default::default() });
        assert!(reviewer.run_meta_review().await.unwrap().is_some());
    }

    async fn offline_fixture() -> (Arc<OfflineStorage>, Arc<ManualClock>) {
        let storage = Arc::new(OfflineStorage::default());
        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        for d in 1..=4 {
            let mut post = PostRecord::new(
                ContentType::Insight,
                Platform::Twitter,
                "plain",
                "topic",
                clock.now() - chrono::Duration::days(d),
            );
            post.replies = Some(2);
            post.performance_score = Some(60);
            storage.insert_post(&post).await.unwrap();
        }
        (storage, clock)
    }

    #[tokio::test]
    async fn test_unreadable_posts_skip_the_review() {
        let (storage, clock) = offline_fixture().await;
        storage.posts_offline.store(true, Ordering::SeqCst);

        let reviewer = MetaReviewer::new(storage.clone(), Arc::new(NoopArchive)).with_clock(clock);
        assert!(reviewer.run_meta_review().await.unwrap().is_none());
        assert!(storage.list_reports().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_persist_failure_is_an_error() {
        let (storage, clock) = offline_fixture().await;
        storage.reports_offline.store(true, Ordering::SeqCst);

        let archive = Arc::new(RecordingArchive::default());
        let reviewer = MetaReviewer::new(storage.clone(), archive.clone()).with_clock(clock);
        let err = reviewer.run_meta_review().await.unwrap_err();
        assert!(matches!(err, ReviewError::Storage(StorageError::Unavailable(_))));
        assert!(archive.reports.lock().unwrap().is_empty());
    }
}
