//! Adaptive content-type selection.

use std::sync::Arc;

use cadence_core::{
    Clock, ContentType, ContentTypeWeight, PostFilter, SystemClock, TtlCache, WeightConfig,
};
use cadence_storage::Storage;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{default_weights, PerformanceWindow, WeightAdjustment, WeightOptimizer};

/// Weighted random draw. Zero weights are never chosen; an empty or
/// all-zero set yields `None`.
pub fn pick_weighted<R: Rng>(weights: &[ContentTypeWeight], rng: &mut R) -> Option<ContentType> {
    let total: u32 = weights.iter().map(|w| w.weight).sum();
    if total == 0 {
        return None;
    }

    let mut roll = rng.gen_range(0..total);
    for w in weights {
        if roll < w.weight {
            return Some(w.content_type);
        }
        roll -= w.weight;
    }
    None
}

/// Keeps the persisted weight set in step with scored outcomes and draws
/// content types from it.
pub struct AdaptiveWeighting<S: Storage> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    config: WeightConfig,
    optimizer: WeightOptimizer,
    cache: Mutex<TtlCache<Vec<ContentTypeWeight>>>,
}

impl<S: Storage> AdaptiveWeighting<S> {
    /// Create with default settings.
    pub fn new(storage: Arc<S>) -> Self {
        Self::build(storage, Arc::new(SystemClock), WeightConfig::default())
    }

    /// Set the clock.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self::build(self.storage, clock, self.config)
    }

    /// Set the configuration.
    pub fn with_config(self, config: WeightConfig) -> Self {
        Self::build(self.storage, self.clock, config)
    }

    fn build(storage: Arc<S>, clock: Arc<dyn Clock>, config: WeightConfig) -> Self {
        let ttl = chrono::Duration::minutes(i64::from(config.cache_ttl_minutes));
        Self {
            storage,
            optimizer: WeightOptimizer::new().with_learning_rate(config.learning_rate),
            cache: Mutex::new(TtlCache::new(ttl, clock.clone())),
            clock,
            config,
        }
    }

    /// Current weight set, served from cache while fresh.
    ///
    /// Falls back to the default set when the store holds none or cannot be
    /// read; a failed read is not cached.
    pub async fn current_weights(&self) -> Vec<ContentTypeWeight> {
        let mut cache = self.cache.lock().await;
        if let Some(weights) = cache.get() {
            return weights;
        }

        match self.storage.load_weights().await {
            Ok(weights) if weights.is_empty() => {
                debug!("No stored weights, using defaults");
                let weights = default_weights();
                cache.store(weights.clone());
                weights
            }
            Ok(weights) => {
                cache.store(weights.clone());
                weights
            }
            Err(e) => {
                warn!("Failed to load weights, using defaults: {}", e);
                default_weights()
            }
        }
    }

    /// Adapt weights to scored posts from the last `window_days` days and
    /// persist the renormalized set. No-op when the window has no scored
    /// post.
    pub async fn adapt_weights(&self, window_days: u32) -> cadence_storage::Result<Vec<WeightAdjustment>> {
        let now = self.clock.now();
        let filter = PostFilter {
            scored: Some(true),
            posted_from: Some(now - chrono::Duration::days(i64::from(window_days))),
            posted_until: Some(now),
            ..Default::default()
        };
        let posts = self.storage.list_posts(&filter).await?;
        let window = PerformanceWindow::from_posts(&posts);
        if window.is_empty() {
            info!("No scored posts in the last {} days, weights unchanged", window_days);
            return Ok(Vec::new());
        }

        let mut weights = self.storage.load_weights().await?;
        if weights.is_empty() {
            weights = default_weights();
        }

        let adjustments = self.optimizer.suggest_adjustments(&weights, &window);
        self.optimizer.apply_adjustments(&mut weights, &adjustments);
        self.storage.save_weights(&weights).await?;

        for a in &adjustments {
            debug!(
                "{}: {} -> {} (differential {:+.1})",
                a.content_type, a.from, a.to, a.differential
            );
        }
        info!(
            "Adapted {} weight(s) from {} scored post(s), overall avg {:.1}",
            adjustments.len(),
            window.total_posts,
            window.overall_avg
        );

        self.cache.lock().await.store(weights);
        Ok(adjustments)
    }

    /// [`Self::adapt_weights`] over the configured window.
    pub async fn adapt_configured(&self) -> cadence_storage::Result<Vec<WeightAdjustment>> {
        self.adapt_weights(self.config.window_days).await
    }

    /// Draw a content type from the current weights.
    pub async fn select_content_type<R: Rng>(&self, rng: &mut R) -> Option<ContentType> {
        let weights = self.current_weights().await;
        pick_weighted(&weights, rng)
    }

    /// Drop the cached weight set.
    pub async fn invalidate(&self) {
        self.cache.lock().await.invalidate();
    }
}
