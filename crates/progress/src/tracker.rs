//! Outcome tracking service.

use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::{
    Clock, ContentType, MetricsUpdate, Platform, PostFilter, PostId, PostRecord, ScoringConfig,
    SystemClock,
};
use cadence_storage::Storage;
use tracing::{debug, info, warn};

use crate::scorer::score_post;

/// Outcome tracking service.
#[async_trait]
pub trait OutcomeTracker: Send + Sync {
    /// Record a newly published post with no metrics yet.
    async fn track_post(
        &self,
        content_type: ContentType,
        platform: Platform,
        tone: &str,
        topic: &str,
    ) -> cadence_storage::Result<PostRecord>;

    /// Write whichever metrics are present in `update`.
    async fn update_post_metrics(
        &self,
        post_id: PostId,
        update: &MetricsUpdate,
    ) -> cadence_storage::Result<()>;

    /// Unscored posts published at least `older_than_hours` ago, oldest first.
    async fn get_unscored_posts(&self, older_than_hours: u32) -> Vec<PostRecord>;

    /// Score every matured, unscored post once. Returns how many were scored.
    async fn score_old_posts(&self) -> usize;
}

/// Basic outcome tracker implementation.
pub struct BasicOutcomeTracker<S: Storage> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    config: ScoringConfig,
}

impl<S: Storage> BasicOutcomeTracker<S> {
    /// Create a tracker with a 48 hour maturation window.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
            config: ScoringConfig::default(),
        }
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl<S: Storage + 'static> OutcomeTracker for BasicOutcomeTracker<S> {
    async fn track_post(
        &self,
        content_type: ContentType,
        platform: Platform,
        tone: &str,
        topic: &str,
    ) -> cadence_storage::Result<PostRecord> {
        let post = PostRecord::new(content_type, platform, tone, topic, self.clock.now());
        self.storage.insert_post(&post).await?;
        info!("Tracking {} post {} on {}", content_type, post.id, platform);
        Ok(post)
    }

    async fn update_post_metrics(
        &self,
        post_id: PostId,
        update: &MetricsUpdate,
    ) -> cadence_storage::Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        self.storage.update_post_metrics(post_id, update).await?;
        debug!("Updated metrics for post {}: {:?}", post_id, update);
        Ok(())
    }

    async fn get_unscored_posts(&self, older_than_hours: u32) -> Vec<PostRecord> {
        let cutoff = self.clock.now() - chrono::Duration::hours(i64::from(older_than_hours));
        let filter = PostFilter {
            scored: Some(false),
            posted_until: Some(cutoff),
            ..Default::default()
        };

        match self.storage.list_posts(&filter).await {
            Ok(posts) => posts,
            Err(e) => {
                warn!("Failed to list unscored posts: {}", e);
                Vec::new()
            }
        }
    }

    async fn score_old_posts(&self) -> usize {
        let posts = self.get_unscored_posts(self.config.maturation_hours).await;
        let mut scored = 0;

        for post in posts {
            let score = score_post(&post);
            match self.storage.set_performance_score(post.id, score).await {
                Ok(true) => {
                    debug!("Scored post {} ({}): {}", post.id, post.content_type, score);
                    scored += 1;
                }
                Ok(false) => debug!("Post {} already scored, skipping", post.id),
                Err(e) => warn!("Failed to score post {}: {}", post.id, e),
            }
        }

        if scored > 0 {
            info!("Scored {} matured post(s)", scored);
        }
        scored
    }
}
