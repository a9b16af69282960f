use crate::CircuitState;
use callguard_core::BreakerName;
use thiserror::Error;

/// The breaker refused a call; the guarded operation was not attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit '{name}' is {state}; call not permitted")]
pub struct Rejected {
    name: BreakerName,
    state: CircuitState,
}

impl Rejected {
    pub(crate) fn new(name: BreakerName, state: CircuitState) -> Self {
        Self { name, state }
    }

    /// Name of the breaker that rejected the call.
    pub fn name(&self) -> &BreakerName {
        &self.name
    }

    /// State the breaker was in when it rejected the call (`Open` or `HalfOpen`).
    pub fn state(&self) -> CircuitState {
        self.state
    }
}

/// Invalid circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The failure rate threshold is outside `(0.0, 1.0]`.
    #[error("failure rate threshold must be in (0.0, 1.0], got {0}")]
    FailureRateThreshold(f64),

    /// The sliding window cannot hold any outcome.
    #[error("sliding window size must be at least 1")]
    EmptyWindow,

    /// The window can never reach the minimum sample size, or the minimum is zero.
    #[error("minimum sample size must be between 1 and the sliding window size ({window}), got {minimum}")]
    MinimumSampleSize { minimum: usize, window: usize },

    /// Half-open would never let a trial call through.
    #[error("max trial calls must be at least 1")]
    NoTrialCalls,
}
