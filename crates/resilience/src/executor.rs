//! Retry executor.
//!
//! Runs an external call with exponential backoff behind the circuit breaker
//! for its dependency:
//!
//! ```text
//! acquire circuit → attempt (with timeout) → classify → backoff → retry
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::breaker::{Admission, CircuitBreaker};
use crate::classify::classify;
use crate::error::{ExternalError, ResilienceError, Result};

/// Per-call retry options.
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Total attempts, including the first
    pub max_retries: u32,
    /// Delay after the first failure; doubles after each further failure
    pub base_delay: Duration,
    /// Stop at the first 4xx instead of retrying it
    pub skip_client_errors: bool,
    /// Circuit breaker key
    pub dependency_key: String,
    /// Bound on a single attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            skip_client_errors: true,
            dependency_key: "default".to_string(),
            attempt_timeout: Duration::from_secs(15),
        }
    }
}

impl RetryOptions {
    /// Options for a dependency with default settings.
    pub fn for_dependency(key: impl Into<String>) -> Self {
        Self {
            dependency_key: key.into(),
            ..Default::default()
        }
    }

    /// Set the attempt count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base backoff delay.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set whether 4xx errors end the call immediately.
    pub fn with_skip_client_errors(mut self, skip: bool) -> Self {
        self.skip_client_errors = skip;
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }
}

/// Delay slept after the failed attempt numbered `attempt` (0-based).
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Runs external calls with retries and circuit breaking.
#[derive(Debug, Clone)]
pub struct ResilientExecutor {
    breaker: Arc<CircuitBreaker>,
}

impl ResilientExecutor {
    /// Create an executor over a breaker registry.
    pub fn new(breaker: Arc<CircuitBreaker>) -> Self {
        Self { breaker }
    }

    /// The breaker registry.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Run `operation` until it succeeds, fails non-retryably, runs out of
    /// attempts, or the circuit rejects it.
    ///
    /// On failure the last attempt's error is returned; partial results are
    /// never surfaced.
    pub async fn execute<T, F, Fut>(&self, options: &RetryOptions, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ExternalError>>,
    {
        let dependency = options.dependency_key.as_str();
        let max_attempts = options.max_retries.max(1);
        let mut attempt: u32 = 0;
        let mut last_failure = None;

        loop {
            let Some(admission) = self.breaker.try_acquire(dependency).await else {
                warn!(dependency, attempt = attempt + 1, "Circuit open, call rejected");
                return Err(match last_failure {
                    Some((class, source)) => ResilienceError::Failed {
                        dependency: dependency.to_string(),
                        attempts: attempt,
                        class,
                        source,
                    },
                    None => ResilienceError::CircuitOpen {
                        dependency: dependency.to_string(),
                    },
                });
            };

            attempt += 1;
            debug!(dependency, attempt, trial = admission == Admission::Trial, "Attempting call");

            let outcome = match tokio::time::timeout(options.attempt_timeout, operation()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ExternalError::Timeout(options.attempt_timeout)),
            };

            let err = match outcome {
                Ok(value) => {
                    self.breaker.record_success(dependency).await;
                    if attempt > 1 {
                        info!(dependency, attempt, "Call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            self.breaker.record_failure(dependency).await;
            let class = classify(&err);

            if !class.is_retryable(options.skip_client_errors) {
                warn!(dependency, attempt, class = %class, error = %err, "Non-retryable failure");
                return Err(ResilienceError::Failed {
                    dependency: dependency.to_string(),
                    attempts: attempt,
                    class,
                    source: err,
                });
            }

            if attempt >= max_attempts {
                error!(dependency, attempt, class = %class, error = %err, "Retries exhausted");
                return Err(ResilienceError::Failed {
                    dependency: dependency.to_string(),
                    attempts: attempt,
                    class,
                    source: err,
                });
            }

            let delay = backoff_delay(options.base_delay, attempt - 1);
            warn!(
                dependency,
                attempt,
                delay_ms = delay.as_millis() as u64,
                class = %class,
                error = %err,
                "Attempt failed, backing off"
            );
            last_failure = Some((class, err));
            tokio::time::sleep(delay).await;
        }
    }
}
