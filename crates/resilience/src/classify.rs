//! Failure classification.
//!
//! All retry decisions go through [`classify`]. The message matching for
//! fatal conditions lives only here, so it can be swapped for typed
//! provider error codes without touching callers.

use serde::{Deserialize, Serialize};

use crate::error::ExternalError;

/// Lower-cased fragments that mark a failure no retry can fix.
const FATAL_MARKERS: &[&str] = &[
    "credit balance is too low",
    "insufficient_quota",
    "insufficient funds",
    "billing hard limit",
    "account has been suspended",
    "api key has been revoked",
];

/// How a failed attempt is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Network trouble, timeouts, 5xx, rate limiting
    Transient,
    /// 4xx status
    Client,
    /// Funding or authorization condition that will not clear on retry
    DomainFatal,
}

impl FailureClass {
    /// Whether another attempt should follow.
    pub fn is_retryable(self, skip_client_errors: bool) -> bool {
        match self {
            FailureClass::Transient => true,
            FailureClass::Client => !skip_client_errors,
            FailureClass::DomainFatal => false,
        }
    }

    /// Stable name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureClass::Transient => "transient",
            FailureClass::Client => "client",
            FailureClass::DomainFatal => "domain_fatal",
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a failed attempt.
///
/// Fatal markers win over the status code: a 402 or 403 carrying a billing
/// message is fatal, not merely a client error.
pub fn classify(error: &ExternalError) -> FailureClass {
    let message = error.to_string().to_lowercase();
    if FATAL_MARKERS.iter().any(|marker| message.contains(marker)) {
        return FailureClass::DomainFatal;
    }

    match error.status() {
        Some(status) if (400..500).contains(&status) => FailureClass::Client,
        _ => FailureClass::Transient,
    }
}
