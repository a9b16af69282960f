use crate::CircuitState;
use callguard_core::{BreakerName, GatewayEvent, Outcome};
use std::time::Instant;

/// Events emitted by a circuit breaker.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// A call was permitted through the circuit breaker.
    CallPermitted {
        name: BreakerName,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A call was rejected without reaching the dependency.
    CallRejected {
        name: BreakerName,
        timestamp: Instant,
        state: CircuitState,
    },
    /// An outcome was reported for a permitted call.
    OutcomeRecorded {
        name: BreakerName,
        timestamp: Instant,
        outcome: Outcome,
        state: CircuitState,
    },
    /// The circuit breaker transitioned between states.
    StateTransition {
        name: BreakerName,
        timestamp: Instant,
        from_state: CircuitState,
        to_state: CircuitState,
    },
}

impl GatewayEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::OutcomeRecorded { .. } => "outcome_recorded",
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::OutcomeRecorded { timestamp, .. }
            | CircuitBreakerEvent::StateTransition { timestamp, .. } => *timestamp,
        }
    }

    fn breaker_name(&self) -> &str {
        match self {
            CircuitBreakerEvent::CallPermitted { name, .. }
            | CircuitBreakerEvent::CallRejected { name, .. }
            | CircuitBreakerEvent::OutcomeRecorded { name, .. }
            | CircuitBreakerEvent::StateTransition { name, .. } => name.as_str(),
        }
    }
}
