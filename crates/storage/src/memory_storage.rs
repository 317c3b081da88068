//! In-memory storage implementation.
//!
//! Shares its tables between clones, so one instance can back several
//! components in tests and short-lived tools. An optional per-call latency
//! simulates the round trip of a remote store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cadence_core::{
    ActionId, ActionRecord, ContentTypeWeight, Day, FollowRecord, MetricsUpdate, PostFilter,
    PostId, PostRecord, WeeklyReport,
};
use tokio::sync::RwLock;

use super::trait_::select_posts;
use super::{Result, Storage, StorageError};

#[derive(Debug, Default)]
struct Tables {
    actions: Vec<ActionRecord>,
    follows: Vec<FollowRecord>,
    posts: Vec<PostRecord>,
    weights: Vec<ContentTypeWeight>,
    reports: Vec<WeeklyReport>,
}

/// Storage held entirely in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
    latency: Option<Duration>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` before touching the tables.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn round_trip(&self) {
        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }
    }

    /// Number of action rows across all days.
    pub async fn action_count(&self) -> usize {
        self.tables.read().await.actions.len()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn insert_action(&self, record: &ActionRecord) -> Result<()> {
        self.round_trip().await;
        self.tables.write().await.actions.push(record.clone());
        Ok(())
    }

    async fn delete_action(&self, id: ActionId) -> Result<()> {
        self.round_trip().await;
        self.tables.write().await.actions.retain(|a| a.id != id);
        Ok(())
    }

    async fn list_actions_for_day(&self, day: Day) -> Result<Vec<ActionRecord>> {
        self.round_trip().await;
        let tables = self.tables.read().await;
        Ok(tables.actions.iter().filter(|a| a.day == day).cloned().collect())
    }

    async fn insert_follow(&self, record: &FollowRecord) -> Result<()> {
        self.round_trip().await;
        self.tables.write().await.follows.push(record.clone());
        Ok(())
    }

    async fn count_follows_for_day(&self, day: Day) -> Result<usize> {
        self.round_trip().await;
        let tables = self.tables.read().await;
        Ok(tables.follows.iter().filter(|f| f.day == day).count())
    }

    async fn insert_post(&self, post: &PostRecord) -> Result<()> {
        self.round_trip().await;
        self.tables.write().await.posts.push(post.clone());
        Ok(())
    }

    async fn load_post(&self, id: PostId) -> Result<Option<PostRecord>> {
        self.round_trip().await;
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn update_post_metrics(&self, id: PostId, update: &MetricsUpdate) -> Result<()> {
        self.round_trip().await;
        let mut tables = self.tables.write().await;
        let post = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("post {}", id)))?;
        post.apply_metrics(update);
        Ok(())
    }

    async fn set_performance_score(&self, id: PostId, score: u8) -> Result<bool> {
        self.round_trip().await;
        let mut tables = self.tables.write().await;
        let post = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("post {}", id)))?;
        if post.performance_score.is_some() {
            return Ok(false);
        }
        post.performance_score = Some(score);
        Ok(true)
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<PostRecord>> {
        self.round_trip().await;
        let tables = self.tables.read().await;
        Ok(select_posts(tables.posts.iter(), filter))
    }

    async fn load_weights(&self) -> Result<Vec<ContentTypeWeight>> {
        self.round_trip().await;
        Ok(self.tables.read().await.weights.clone())
    }

    async fn save_weights(&self, weights: &[ContentTypeWeight]) -> Result<()> {
        self.round_trip().await;
        self.tables.write().await.weights = weights.to_vec();
        Ok(())
    }

    async fn append_report(&self, report: &WeeklyReport) -> Result<()> {
        self.round_trip().await;
        self.tables.write().await.reports.push(report.clone());
        Ok(())
    }

    async fn list_reports(&self) -> Result<Vec<WeeklyReport>> {
        self.round_trip().await;
        Ok(self.tables.read().await.reports.clone())
    }
}
