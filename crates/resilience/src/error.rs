//! Failures of outbound calls and of the executor wrapping them.

use std::time::Duration;

use crate::classify::FailureClass;

/// Error type for executor operations.
pub type Result<T> = std::result::Result<T, ResilienceError>;

/// A single failed attempt at an external call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExternalError {
    /// The dependency answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http {
        /// Status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The attempt did not finish within its timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl ExternalError {
    /// Status code, when the dependency returned one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ExternalError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Why the executor gave up.
#[derive(Debug, thiserror::Error)]
pub enum ResilienceError {
    /// The circuit for this dependency is open; the operation was not invoked
    #[error("circuit open for {dependency}")]
    CircuitOpen {
        /// Dependency key
        dependency: String,
    },

    /// The last attempt failed and no further attempt will be made
    #[error("{dependency} failed after {attempts} attempt(s) ({class}): {source}")]
    Failed {
        /// Dependency key
        dependency: String,
        /// Attempts made
        attempts: u32,
        /// Classification of the final error
        class: FailureClass,
        /// The final attempt's error
        #[source]
        source: ExternalError,
    },
}

impl ResilienceError {
    /// Attempts made before giving up (0 when the circuit rejected the call).
    pub fn attempts(&self) -> u32 {
        match self {
            ResilienceError::CircuitOpen { .. } => 0,
            ResilienceError::Failed { attempts, .. } => *attempts,
        }
    }
}
