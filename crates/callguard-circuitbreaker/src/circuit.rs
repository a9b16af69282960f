use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
use crate::window::SlidingWindow;
use callguard_core::{BreakerName, Outcome};
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[repr(u8)]
pub enum CircuitState {
    /// The circuit is closed and calls are allowed.
    Closed = 0,
    /// The circuit is open and calls are rejected.
    Open = 1,
    /// The circuit is half-open and a limited number of trial calls are allowed.
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    /// Upper-case label, e.g. `HALF_OPEN`.
    pub fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of one breaker, taken under its lock.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CircuitMetrics {
    /// Current state.
    pub state: CircuitState,
    /// Outcomes currently held by the sliding window.
    pub window_len: usize,
    /// Failures and timeouts in the window.
    pub failure_count: usize,
    /// Successes in the window.
    pub success_count: usize,
    /// Failure rate of the window (0.0 to 1.0).
    pub failure_rate: f64,
    /// Trial permits issued in the current half-open period.
    pub trial_calls: usize,
    /// Time since the last state transition.
    pub time_since_state_change: Duration,
}

pub(crate) struct Circuit {
    name: BreakerName,
    state: CircuitState,
    state_atomic: Arc<AtomicU8>,
    window: SlidingWindow,
    last_state_change: Instant,
    last_opened_at: Option<Instant>,
    trial_calls: usize,
    // Bumped on every transition; permits carry the value they were issued under.
    generation: u64,
}

impl Circuit {
    pub(crate) fn new(
        name: BreakerName,
        config: &CircuitBreakerConfig,
        state_atomic: Arc<AtomicU8>,
    ) -> Self {
        state_atomic.store(CircuitState::Closed as u8, Ordering::Release);
        Self {
            name,
            state: CircuitState::Closed,
            state_atomic,
            window: SlidingWindow::new(config.sliding_window_size),
            last_state_change: Instant::now(),
            last_opened_at: None,
            trial_calls: 0,
            generation: 0,
        }
    }

    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn window(&self) -> &SlidingWindow {
        &self.window
    }

    pub(crate) fn metrics(&self) -> CircuitMetrics {
        CircuitMetrics {
            state: self.state,
            window_len: self.window.len(),
            failure_count: self.window.failure_count(),
            success_count: self.window.success_count(),
            failure_rate: self.window.failure_rate(),
            trial_calls: self.trial_calls,
            time_since_state_change: self.last_state_change.elapsed(),
        }
    }

    /// Decides whether a call may proceed. Returns the generation the
    /// permit belongs to, or `None` if the call is rejected.
    pub(crate) fn try_acquire(&mut self, config: &CircuitBreakerConfig) -> Option<u64> {
        let permitted = match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let cooled_down = self
                    .last_opened_at
                    .map(|opened| opened.elapsed() >= config.open_cooldown)
                    .unwrap_or(true);
                if cooled_down {
                    self.transition_to(CircuitState::HalfOpen, config);
                    self.trial_calls = 1;
                }
                cooled_down
            }
            CircuitState::HalfOpen => {
                if self.trial_calls < config.max_trial_calls {
                    self.trial_calls += 1;
                    true
                } else {
                    false
                }
            }
        };

        if permitted {
            config
                .event_listeners
                .emit(&CircuitBreakerEvent::CallPermitted {
                    name: self.name.clone(),
                    timestamp: now(),
                    state: self.state,
                });
            Some(self.generation)
        } else {
            config
                .event_listeners
                .emit(&CircuitBreakerEvent::CallRejected {
                    name: self.name.clone(),
                    timestamp: now(),
                    state: self.state,
                });

            #[cfg(feature = "metrics")]
            counter!("circuitbreaker_calls_total", "circuitbreaker" => self.name.to_string(), "outcome" => "rejected").increment(1);

            None
        }
    }

    /// Records an outcome. `generation` is the permit's generation, or `None`
    /// when the outcome is reported without a permit.
    pub(crate) fn record(
        &mut self,
        outcome: Outcome,
        generation: Option<u64>,
        config: &CircuitBreakerConfig,
    ) {
        // A permit issued before the last transition says nothing about the
        // current period, and an open circuit has no window to record into.
        if generation.is_some_and(|g| g != self.generation) || self.state == CircuitState::Open {
            #[cfg(feature = "tracing")]
            tracing::debug!(breaker = %self.name, outcome = outcome.as_str(), "outcome ignored");
            return;
        }

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::OutcomeRecorded {
                name: self.name.clone(),
                timestamp: now(),
                outcome,
                state: self.state,
            });

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => self.name.to_string(), "outcome" => outcome.as_str()).increment(1);

        match self.state {
            CircuitState::Closed => {
                self.window.record(outcome);
                self.evaluate_window(config);
            }
            CircuitState::HalfOpen => {
                self.window.record(outcome);
                if outcome.is_success() {
                    self.transition_to(CircuitState::Closed, config);
                } else {
                    self.transition_to(CircuitState::Open, config);
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Returns an unused trial slot, if the permit's half-open period is
    /// still current.
    pub(crate) fn release_trial(&mut self, generation: u64) {
        if self.state == CircuitState::HalfOpen
            && self.generation == generation
            && self.trial_calls > 0
        {
            self.trial_calls -= 1;
        }
    }

    pub(crate) fn reset(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Closed, config);
        self.window.clear();
    }

    fn evaluate_window(&mut self, config: &CircuitBreakerConfig) {
        if self.window.len() < config.minimum_sample_size {
            return;
        }
        if self.window.failure_rate() >= config.failure_rate_threshold {
            self.transition_to(CircuitState::Open, config);
        }
    }

    fn transition_to(&mut self, state: CircuitState, config: &CircuitBreakerConfig) {
        if self.state == state {
            return;
        }

        let from_state = self.state;
        let now = Instant::now();

        self.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        self.last_state_change = now;
        if state == CircuitState::Open {
            self.last_opened_at = Some(now);
        }
        self.window.clear();
        self.trial_calls = 0;
        self.generation = self.generation.wrapping_add(1);

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                name: self.name.clone(),
                timestamp: now.into_std(),
                from_state,
                to_state: state,
            });

        #[cfg(feature = "tracing")]
        tracing::info!(breaker = %self.name, from = %from_state, to = %state, "circuit state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "circuitbreaker_transitions_total",
                "circuitbreaker" => self.name.to_string(),
                "from" => from_state.as_str(),
                "to" => state.as_str()
            )
            .increment(1);
            gauge!("circuitbreaker_state", "circuitbreaker" => self.name.to_string())
                .set(state as u8 as f64);
        }
    }
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}
