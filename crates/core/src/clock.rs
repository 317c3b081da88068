//! Injectable wall clock.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::{Day, Time};

/// Source of "now". Every component reads time through this so that day
/// boundaries and maturation windows can be driven from tests.
pub trait Clock: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> Time;

    /// Current UTC calendar day.
    fn today(&self) -> Day {
        self.now().date_naive()
    }
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Time {
        chrono::Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: Time) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, at: Time) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: chrono::Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Time {
        let millis = self.millis.load(Ordering::SeqCst);
        chrono::DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }
}
