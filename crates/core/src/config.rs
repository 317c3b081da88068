//! Runtime configuration.
//!
//! Every section defaults to the production constants, so a config file only
//! needs the keys it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors from loading configuration or parsing names.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unrecognised name
    #[error("{0}")]
    Parse(String),
}

/// Daily action caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Actions of any kind per UTC day
    pub daily_total: u32,
    /// Discretionary actions per UTC day
    pub discretionary: u32,
    /// Follows per UTC day
    pub daily_follow_limit: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily_total: 23,
            discretionary: 10,
            daily_follow_limit: 20,
        }
    }
}

/// Scorer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Hours a post must age before it is scored
    pub maturation_hours: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { maturation_hours: 48 }
    }
}

/// Adaptive weighting settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    /// Fraction of the score differential applied per step
    pub learning_rate: f64,
    /// Days of scored posts considered
    pub window_days: u32,
    /// Minutes the weight set is cached for selection
    pub cache_ttl_minutes: u32,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.2,
            window_days: 14,
            cache_ttl_minutes: 60,
        }
    }
}

/// Meta review settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Scored posts required in the week
    pub min_posts: u32,
    /// Score difference beyond which a trend is reported
    pub trend_threshold: f64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            min_posts: 3,
            trend_threshold: 3.0,
        }
    }
}

/// Retry settings for outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per call
    pub max_retries: u32,
    /// First backoff delay
    pub base_delay_ms: u64,
    /// Give up immediately on 4xx
    pub skip_client_errors: bool,
    /// Per-attempt timeout
    pub attempt_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            skip_client_errors: true,
            attempt_timeout_secs: 15,
        }
    }
}

/// Circuit breaker settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// Seconds the circuit stays open before a trial call
    pub cooldown_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_secs: 60,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Daily caps
    pub budget: BudgetConfig,
    /// Scorer
    pub scoring: ScoringConfig,
    /// Adaptive weighting
    pub weights: WeightConfig,
    /// Meta review
    pub review: ReviewConfig,
    /// Retries
    pub retry: RetryConfig,
    /// Circuit breaker
    pub breaker: BreakerConfig,
}

impl GovernorConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_production_constants() {
        let config = GovernorConfig::default();
        assert_eq!(config.budget.daily_total, 23);
        assert_eq!(config.budget.discretionary, 10);
        assert_eq!(config.weights.learning_rate, 0.2);
        assert_eq!(config.review.min_posts, 3);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cadence.json");
        std::fs::write(&path, r#"{"budget": {"discretionary": 4}, "retry": {"max_retries": 5}}"#).unwrap();

        let config = GovernorConfig::load(&path).unwrap();
        assert_eq!(config.budget.discretionary, 4);
        assert_eq!(config.budget.daily_total, 23);
        assert_eq!(config.retry.max_retries, 5);
        assert!(config.retry.skip_client_errors);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = GovernorConfig::load("/nonexistent/cadence.json").unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
