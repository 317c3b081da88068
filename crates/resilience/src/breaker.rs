//! Per-dependency circuit breaker.
//!
//! State is process-local. Two agent processes calling the same dependency
//! keep separate circuits; the deployment runs a single instance.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

/// Configuration for the circuit breaker.
#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// How long the circuit stays open before a trial call
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
        }
    }
}

/// Circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls flow normally
    Closed,
    /// Calls are rejected without reaching the dependency
    Open,
    /// One trial call is allowed through
    HalfOpen,
}

/// How a call was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Circuit closed
    Normal,
    /// The single trial call of a half-open circuit
    Trial,
}

#[derive(Debug)]
struct Circuit {
    consecutive_failures: u32,
    state: CircuitState,
    opened_at: Option<Instant>,
    trial_started: Option<Instant>,
}

impl Circuit {
    fn closed() -> Self {
        Self {
            consecutive_failures: 0,
            state: CircuitState::Closed,
            opened_at: None,
            trial_started: None,
        }
    }

    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.trial_started = None;
    }
}

/// Circuit breakers keyed by dependency.
#[derive(Debug, Default)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    circuits: Mutex<HashMap<String, Circuit>>,
}

impl CircuitBreaker {
    /// Create a breaker registry.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            circuits: Mutex::new(HashMap::new()),
        }
    }

    /// Ask to call `dependency`. `None` means reject without calling.
    pub async fn try_acquire(&self, dependency: &str) -> Option<Admission> {
        let mut circuits = self.circuits.lock().await;
        let circuit = circuits
            .entry(dependency.to_string())
            .or_insert_with(Circuit::closed);

        match circuit.state {
            CircuitState::Closed => Some(Admission::Normal),
            CircuitState::Open => {
                let cooled = circuit
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.cooldown)
                    .unwrap_or(true);
                if !cooled {
                    return None;
                }
                info!(dependency, "Circuit half-open, allowing trial call");
                circuit.state = CircuitState::HalfOpen;
                circuit.trial_started = Some(Instant::now());
                Some(Admission::Trial)
            }
            CircuitState::HalfOpen => {
                // A trial that never reported back (its caller was dropped)
                // is given up after one cooldown.
                if let Some(started) = circuit.trial_started {
                    if started.elapsed() < self.config.cooldown {
                        return None;
                    }
                    warn!(dependency, "Trial call never reported back, allowing another");
                }
                circuit.trial_started = Some(Instant::now());
                Some(Admission::Trial)
            }
        }
    }

    /// Record a successful call. Closes the circuit and resets the count.
    pub async fn record_success(&self, dependency: &str) {
        let mut circuits = self.circuits.lock().await;
        let circuit = circuits
            .entry(dependency.to_string())
            .or_insert_with(Circuit::closed);

        if circuit.state != CircuitState::Closed {
            info!(dependency, "Circuit closed after successful trial");
        }
        *circuit = Circuit::closed();
    }

    /// Record a failed call.
    pub async fn record_failure(&self, dependency: &str) {
        let mut circuits = self.circuits.lock().await;
        let circuit = circuits
            .entry(dependency.to_string())
            .or_insert_with(Circuit::closed);

        circuit.consecutive_failures += 1;
        match circuit.state {
            CircuitState::HalfOpen => {
                warn!(dependency, "Trial call failed, circuit reopened");
                circuit.open();
            }
            CircuitState::Closed if circuit.consecutive_failures >= self.config.failure_threshold => {
                warn!(
                    dependency,
                    failures = circuit.consecutive_failures,
                    cooldown_secs = self.config.cooldown.as_secs(),
                    "Circuit opened"
                );
                circuit.open();
            }
            _ => {}
        }
    }

    /// Current state. An open circuit whose cooldown has elapsed still reads
    /// as open until the next call takes the trial slot.
    pub async fn state(&self, dependency: &str) -> CircuitState {
        let circuits = self.circuits.lock().await;
        circuits
            .get(dependency)
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }

    /// Consecutive failures recorded since the last success.
    pub async fn consecutive_failures(&self, dependency: &str) -> u32 {
        let circuits = self.circuits.lock().await;
        circuits
            .get(dependency)
            .map(|c| c.consecutive_failures)
            .unwrap_or(0)
    }
}
