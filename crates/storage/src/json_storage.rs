//! JSON file storage implementation.
//!
//! Stores each logical table as one JSON array file under a `.cadence`
//! directory. Writes are read-modify-write of the whole file, serialized
//! within the process; there is no locking across processes. Each write
//! lands in a temp file that is renamed over the table, so readers see
//! either the old rows or the new ones.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::{
    ActionId, ActionRecord, ContentTypeWeight, Day, FollowRecord, MetricsUpdate, PostFilter,
    PostId, PostRecord, WeeklyReport,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::trait_::select_posts;
use super::{Result, Storage, StorageError};

const ACTIONS: &str = "actions.json";
const FOLLOWS: &str = "follows.json";
const POSTS: &str = "posts.json";
const WEIGHTS: &str = "weights.json";
const REPORTS: &str = "reports.json";

/// File-based JSON storage backend.
#[derive(Clone)]
pub struct JsonStorage {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonStorage {
    /// Create storage rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;

        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.root.join(table)
    }

    async fn read<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>> {
        read_table(&self.table_path(table)).await
    }

    async fn write<T: Serialize>(&self, table: &str, rows: &[T]) -> Result<()> {
        let json = serde_json::to_string_pretty(rows)?;
        let path = self.table_path(table);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, &path).await?;
        debug!("Wrote {} rows to {}", rows.len(), table);
        Ok(())
    }

    /// Load a table, let `f` change it, and write it back.
    async fn modify<T, R, F>(&self, table: &str, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> Result<R>,
    {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.read::<T>(table).await?;
        let out = f(&mut rows)?;
        self.write(table, &rows).await?;
        Ok(out)
    }
}

#[async_trait]
impl Storage for JsonStorage {
    async fn insert_action(&self, record: &ActionRecord) -> Result<()> {
        self.modify(ACTIONS, |rows: &mut Vec<ActionRecord>| {
            rows.push(record.clone());
            Ok(())
        })
        .await
    }

    async fn delete_action(&self, id: ActionId) -> Result<()> {
        self.modify(ACTIONS, |rows: &mut Vec<ActionRecord>| {
            rows.retain(|a| a.id != id);
            Ok(())
        })
        .await
    }

    async fn list_actions_for_day(&self, day: Day) -> Result<Vec<ActionRecord>> {
        let rows: Vec<ActionRecord> = self.read(ACTIONS).await?;
        Ok(rows.into_iter().filter(|a| a.day == day).collect())
    }

    async fn insert_follow(&self, record: &FollowRecord) -> Result<()> {
        self.modify(FOLLOWS, |rows: &mut Vec<FollowRecord>| {
            rows.push(record.clone());
            Ok(())
        })
        .await
    }

    async fn count_follows_for_day(&self, day: Day) -> Result<usize> {
        let rows: Vec<FollowRecord> = self.read(FOLLOWS).await?;
        Ok(rows.iter().filter(|f| f.day == day).count())
    }

    async fn insert_post(&self, post: &PostRecord) -> Result<()> {
        self.modify(POSTS, |rows: &mut Vec<PostRecord>| {
            rows.push(post.clone());
            Ok(())
        })
        .await
    }

    async fn load_post(&self, id: PostId) -> Result<Option<PostRecord>> {
        let rows: Vec<PostRecord> = self.read(POSTS).await?;
        Ok(rows.into_iter().find(|p| p.id == id))
    }

    async fn update_post_metrics(&self, id: PostId, update: &MetricsUpdate) -> Result<()> {
        self.modify(POSTS, |rows: &mut Vec<PostRecord>| {
            let post = rows
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| StorageError::NotFound(format!("post {}", id)))?;
            post.apply_metrics(update);
            Ok(())
        })
        .await
    }

    async fn set_performance_score(&self, id: PostId, score: u8) -> Result<bool> {
        self.modify(POSTS, |rows: &mut Vec<PostRecord>| {
            let post = rows
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| StorageError::NotFound(format!("post {}", id)))?;
            if post.performance_score.is_some() {
                return Ok(false);
            }
            post.performance_score = Some(score);
            Ok(true)
        })
        .await
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<PostRecord>> {
        let rows: Vec<PostRecord> = self.read(POSTS).await?;
        Ok(select_posts(rows.iter(), filter))
    }

    async fn load_weights(&self) -> Result<Vec<ContentTypeWeight>> {
        self.read(WEIGHTS).await
    }

    async fn save_weights(&self, weights: &[ContentTypeWeight]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(WEIGHTS, weights).await
    }

    async fn append_report(&self, report: &WeeklyReport) -> Result<()> {
        self.modify(REPORTS, |rows: &mut Vec<WeeklyReport>| {
            rows.push(report.clone());
            Ok(())
        })
        .await
    }

    async fn list_reports(&self) -> Result<Vec<WeeklyReport>> {
        self.read(REPORTS).await
    }
}

async fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    match fs::read_to_string(path).await {
        Ok(json) if json.trim().is_empty() => Ok(Vec::new()),
        Ok(json) => Ok(serde_json::from_str(&json)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}
