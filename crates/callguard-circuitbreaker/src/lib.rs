//! Circuit breaker for guarded inter-service calls.
//!
//! A circuit breaker stops calling a dependency that keeps failing, gives it
//! time to recover, and then tests it with a limited number of trial calls.
//!
//! ## States
//! - **Closed**: normal operation, every call is permitted
//! - **Open**: the dependency is considered down, calls are rejected
//! - **Half-Open**: after the cooldown, a limited number of trial calls test recovery
//!
//! ```text
//! CLOSED ──[failure rate >= threshold, enough samples]──> OPEN
//! OPEN ──[cooldown elapsed, on next allow()]──> HALF_OPEN
//! HALF_OPEN ──[trial succeeds]──> CLOSED
//! HALF_OPEN ──[trial fails or times out]──> OPEN
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use callguard_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
//! use callguard_core::Outcome;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = CircuitBreakerConfig::builder()
//!     .failure_rate_threshold(0.5)
//!     .sliding_window_size(10)
//!     .minimum_sample_size(5)
//!     .open_cooldown(Duration::from_secs(10))
//!     .build()
//!     .unwrap();
//!
//! let breaker = Arc::new(CircuitBreaker::new("orderService", config));
//!
//! match breaker.allow() {
//!     Ok(permit) => {
//!         // ... perform the remote call ...
//!         permit.record(Outcome::Success);
//!     }
//!     Err(rejected) => eprintln!("{rejected}"),
//! }
//! assert_eq!(breaker.state(), CircuitState::Closed);
//! # }
//! ```
//!
//! ## Registry
//!
//! A [`BreakerRegistry`] owns one breaker per dependency name and creates
//! them lazily. Breakers never share a lock with each other.
//!
//! ## Feature Flags
//! - `metrics`: counters and gauges via the `metrics` crate
//! - `tracing`: permit decisions and transitions via the `tracing` crate
//! - `serde`: `Serialize` for [`CircuitState`] and [`CircuitMetrics`]

use crate::circuit::Circuit;
use callguard_core::{BreakerName, Outcome};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
#[cfg(feature = "tracing")]
use tracing::trace;

pub use circuit::{CircuitMetrics, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::{ConfigError, Rejected};
pub use events::CircuitBreakerEvent;
pub use registry::BreakerRegistry;
pub use window::SlidingWindow;

mod circuit;
mod config;
mod error;
mod events;
mod registry;
mod window;

/// Circuit breaker guarding one named dependency.
///
/// `allow` and `on_outcome` serialize on this breaker's own lock; the lock is
/// never held across an `.await`.
pub struct CircuitBreaker {
    name: BreakerName,
    circuit: Mutex<Circuit>,
    state_atomic: Arc<AtomicU8>,
    config: Arc<CircuitBreakerConfig>,
}

impl CircuitBreaker {
    /// Creates a closed breaker.
    pub fn new(
        name: impl Into<BreakerName>,
        config: impl Into<Arc<CircuitBreakerConfig>>,
    ) -> Self {
        let name = name.into();
        let config = config.into();
        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        Self {
            circuit: Mutex::new(Circuit::new(
                name.clone(),
                &config,
                Arc::clone(&state_atomic),
            )),
            name,
            state_atomic,
            config,
        }
    }

    /// Name of the guarded dependency.
    pub fn name(&self) -> &BreakerName {
        &self.name
    }

    /// Configuration this breaker was built from.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Asks whether a call may proceed.
    ///
    /// - Closed: always permitted.
    /// - Open: rejected until the cooldown has elapsed since the circuit
    ///   opened; the first request after that moves the circuit to
    ///   half-open and receives the first trial permit.
    /// - Half-open: permitted while fewer than `max_trial_calls` trial
    ///   permits have been issued, rejected otherwise.
    ///
    /// The decision and the trial counter update happen under one lock, so
    /// concurrent callers can never obtain more trial permits than configured.
    pub fn allow(self: &Arc<Self>) -> Result<Permit, Rejected> {
        let decision = {
            let mut circuit = self.circuit.lock();
            circuit
                .try_acquire(&self.config)
                .map(|generation| (generation, circuit.state()))
                .ok_or_else(|| circuit.state())
        };

        match decision {
            Ok((generation, state)) => {
                #[cfg(feature = "tracing")]
                trace!(breaker = %self.name, %state, "circuit breaker permitted call");

                Ok(Permit {
                    breaker: Arc::clone(self),
                    generation,
                    state,
                    recorded: false,
                })
            }
            Err(state) => {
                #[cfg(feature = "tracing")]
                trace!(breaker = %self.name, %state, "circuit breaker rejected call");

                Err(Rejected::new(self.name.clone(), state))
            }
        }
    }

    /// Reports the outcome of a call made without holding a [`Permit`].
    ///
    /// Prefer [`Permit::record`]; this entry point treats the outcome as
    /// belonging to the current period, so in half-open it decides the trial.
    pub fn on_outcome(&self, outcome: Outcome) {
        self.circuit.lock().record(outcome, None, &self.config);
    }

    /// Returns the current state without taking the lock.
    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }

    /// Returns whether the circuit is currently open.
    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    /// Returns a snapshot of the window and state.
    pub fn metrics(&self) -> CircuitMetrics {
        self.circuit.lock().metrics()
    }

    /// Forces the circuit closed and clears the window.
    pub fn reset(&self) {
        self.circuit.lock().reset(&self.config);
    }

    /// HTTP status code describing this dependency.
    ///
    /// - Closed: 200
    /// - HalfOpen: 200 (accepting trial traffic)
    /// - Open: 503
    pub fn http_status(&self) -> u16 {
        match self.state() {
            CircuitState::Closed | CircuitState::HalfOpen => 200,
            CircuitState::Open => 503,
        }
    }

    /// Returns "healthy" when closed, "degraded" when half-open and
    /// "unhealthy" when open.
    pub fn health_status(&self) -> &'static str {
        match self.state() {
            CircuitState::Closed => "healthy",
            CircuitState::HalfOpen => "degraded",
            CircuitState::Open => "unhealthy",
        }
    }

    fn record_permitted(&self, outcome: Outcome, generation: u64) {
        self.circuit
            .lock()
            .record(outcome, Some(generation), &self.config);
    }

    fn release_trial(&self, generation: u64) {
        self.circuit.lock().release_trial(generation);
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

/// Permission to perform one guarded call.
///
/// Consumed by [`Permit::record`]. A trial permit dropped without recording
/// (for example because the caller was cancelled) hands its slot back, so an
/// abandoned trial call cannot keep the circuit half-open forever.
#[must_use = "record the call outcome with Permit::record"]
pub struct Permit {
    breaker: Arc<CircuitBreaker>,
    generation: u64,
    state: CircuitState,
    recorded: bool,
}

impl Permit {
    /// State of the circuit when the permit was issued (`Closed` or `HalfOpen`).
    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Returns true if this permit is a half-open trial.
    pub fn is_trial(&self) -> bool {
        self.state == CircuitState::HalfOpen
    }

    /// Breaker that issued this permit.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Reports the call outcome to the breaker.
    pub fn record(mut self, outcome: Outcome) {
        self.recorded = true;
        self.breaker.record_permitted(outcome, self.generation);
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        if !self.recorded && self.is_trial() {
            self.breaker.release_trial(self.generation);
        }
    }
}

impl fmt::Debug for Permit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permit")
            .field("breaker", &self.breaker.name)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish()
    }
}
