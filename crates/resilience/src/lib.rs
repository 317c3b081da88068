//! Resilience layer - retries, backoff and circuit breaking for outbound calls.
//!
//! Independent of the rest of Cadence: any async call that fails with an
//! [`ExternalError`] can be run through [`ResilientExecutor::execute`].

#![warn(missing_docs)]

pub mod classify;
pub mod error;
pub mod breaker;
pub mod executor;
pub mod generation;

pub use classify::{classify, FailureClass};
pub use error::{ExternalError, ResilienceError, Result};
pub use breaker::{Admission, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use executor::{backoff_delay, ResilientExecutor, RetryOptions};
pub use generation::{
    Generation, GenerationClient, GenerationOptions, HttpGenerationClient, ResilientGenerator,
};
