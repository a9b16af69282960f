use crate::error::ConfigError;
use crate::events::CircuitBreakerEvent;
use crate::CircuitState;
use callguard_core::{EventListeners, FnListener, Outcome};
use std::time::Duration;

/// Configuration shared by every breaker created from it.
///
/// A [`BreakerRegistry`](crate::BreakerRegistry) hands one configuration to
/// all lazily created breakers; event listeners therefore receive the
/// breaker name with every event.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    pub(crate) failure_rate_threshold: f64,
    pub(crate) sliding_window_size: usize,
    pub(crate) minimum_sample_size: usize,
    pub(crate) open_cooldown: Duration,
    pub(crate) max_trial_calls: usize,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Failure ratio (0.0 to 1.0) at or above which a closed circuit opens.
    pub fn failure_rate_threshold(&self) -> f64 {
        self.failure_rate_threshold
    }

    /// Capacity of the sliding outcome window.
    pub fn sliding_window_size(&self) -> usize {
        self.sliding_window_size
    }

    /// Number of recorded outcomes required before the ratio is evaluated.
    pub fn minimum_sample_size(&self) -> usize {
        self.minimum_sample_size
    }

    /// How long an open circuit rejects calls before allowing a trial.
    pub fn open_cooldown(&self) -> Duration {
        self.open_cooldown
    }

    /// Trial permits granted per half-open period.
    pub fn max_trial_calls(&self) -> usize {
        self.max_trial_calls
    }

    /// Checks the invariants the state machine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.failure_rate_threshold > 0.0 && self.failure_rate_threshold <= 1.0) {
            return Err(ConfigError::FailureRateThreshold(
                self.failure_rate_threshold,
            ));
        }
        if self.sliding_window_size == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if self.minimum_sample_size == 0 || self.minimum_sample_size > self.sliding_window_size {
            return Err(ConfigError::MinimumSampleSize {
                minimum: self.minimum_sample_size,
                window: self.sliding_window_size,
            });
        }
        if self.max_trial_calls == 0 {
            return Err(ConfigError::NoTrialCalls);
        }
        Ok(())
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        let builder = CircuitBreakerConfigBuilder::new();
        Self {
            failure_rate_threshold: builder.failure_rate_threshold,
            sliding_window_size: builder.sliding_window_size,
            minimum_sample_size: builder.minimum_sample_size,
            open_cooldown: builder.open_cooldown,
            max_trial_calls: builder.max_trial_calls,
            event_listeners: builder.event_listeners,
        }
    }
}

/// Builder for [`CircuitBreakerConfig`].
pub struct CircuitBreakerConfigBuilder {
    failure_rate_threshold: f64,
    sliding_window_size: usize,
    minimum_sample_size: usize,
    open_cooldown: Duration,
    max_trial_calls: usize,
    event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            failure_rate_threshold: 0.5,
            sliding_window_size: 10,
            minimum_sample_size: 5,
            open_cooldown: Duration::from_secs(10),
            max_trial_calls: 1,
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the failure rate at or above which the circuit opens.
    ///
    /// Expressed as a fraction: `0.5` means 50%.
    ///
    /// Default: 0.5
    pub fn failure_rate_threshold(mut self, rate: f64) -> Self {
        self.failure_rate_threshold = rate;
        self
    }

    /// Sets how many recent outcomes the sliding window keeps.
    ///
    /// Default: 10
    pub fn sliding_window_size(mut self, size: usize) -> Self {
        self.sliding_window_size = size;
        self
    }

    /// Sets the number of outcomes that must be recorded before the failure
    /// rate can open the circuit.
    ///
    /// Default: 5
    pub fn minimum_sample_size(mut self, n: usize) -> Self {
        self.minimum_sample_size = n;
        self
    }

    /// Sets how long the circuit stays open before a trial call is allowed.
    ///
    /// Default: 10 seconds
    pub fn open_cooldown(mut self, duration: Duration) -> Self {
        self.open_cooldown = duration;
        self
    }

    /// Sets how many trial calls are permitted while half-open.
    ///
    /// Default: 1
    pub fn max_trial_calls(mut self, n: usize) -> Self {
        self.max_trial_calls = n;
        self
    }

    /// Registers a callback for state transitions.
    ///
    /// Called with the breaker name, the previous state and the new state.
    ///
    /// ```rust
    /// use callguard_circuitbreaker::{CircuitBreakerConfig, CircuitState};
    ///
    /// let config = CircuitBreakerConfig::builder()
    ///     .on_state_transition(|name, from, to| {
    ///         if to == CircuitState::Open {
    ///             eprintln!("{name}: {from} -> {to}, dependency degraded");
    ///         }
    ///     })
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::StateTransition {
                    name,
                    from_state,
                    to_state,
                    ..
                } = event
                {
                    f(name.as_str(), *from_state, *to_state);
                }
            }));
        self
    }

    /// Registers a callback for permitted calls, with the state that permitted it.
    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::CallPermitted { name, state, .. } = event {
                    f(name.as_str(), *state);
                }
            }));
        self
    }

    /// Registers a callback for rejected calls.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::CallRejected { name, .. } = event {
                    f(name.as_str());
                }
            }));
        self
    }

    /// Registers a callback for every outcome that reaches the window.
    ///
    /// Outcomes ignored because the circuit is open, or because their permit
    /// predates the last transition, are not reported.
    pub fn on_outcome<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Outcome) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::OutcomeRecorded { name, outcome, .. } = event {
                    f(name.as_str(), *outcome);
                }
            }));
        self
    }

    /// Registers a listener receiving every breaker event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&CircuitBreakerEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<CircuitBreakerConfig, ConfigError> {
        let config = CircuitBreakerConfig {
            failure_rate_threshold: self.failure_rate_threshold,
            sliding_window_size: self.sliding_window_size,
            minimum_sample_size: self.minimum_sample_size,
            open_cooldown: self.open_cooldown,
            max_trial_calls: self.max_trial_calls,
            event_listeners: self.event_listeners,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
