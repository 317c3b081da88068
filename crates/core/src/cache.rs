//! Time-bounded cached value.

use std::sync::Arc;

use crate::{Clock, Time};

/// A value plus the time it was fetched, considered fresh for `ttl`.
///
/// Freshness is judged against the injected clock, never the system time.
pub struct TtlCache<T> {
    value: Option<T>,
    fetched_at: Option<Time>,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> TtlCache<T> {
    /// Create an empty cache.
    pub fn new(ttl: chrono::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            value: None,
            fetched_at: None,
            ttl,
            clock,
        }
    }

    /// Whether a value is present and younger than the TTL.
    pub fn is_fresh(&self) -> bool {
        match self.fetched_at {
            Some(at) => self.value.is_some() && self.clock.now() - at < self.ttl,
            None => false,
        }
    }

    /// The cached value, if still fresh.
    pub fn get(&self) -> Option<T> {
        if self.is_fresh() {
            self.value.clone()
        } else {
            None
        }
    }

    /// Replace the value and restart the TTL.
    pub fn store(&mut self, value: T) {
        self.value = Some(value);
        self.fetched_at = Some(self.clock.now());
    }

    /// Drop the value so the next read refreshes.
    pub fn invalidate(&mut self) {
        self.value = None;
        self.fetched_at = None;
    }

    /// When the current value was fetched.
    pub fn fetched_at(&self) -> Option<Time> {
        self.fetched_at
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for TtlCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("value", &self.value)
            .field("fetched_at", &self.fetched_at)
            .field("ttl", &self.ttl)
            .finish()
    }
}
