use callguard_core::{BreakerName, GatewayEvent};
use std::time::{Duration, Instant};

/// Events emitted by the call executor.
#[derive(Debug, Clone)]
pub enum ExecutorEvent {
    /// The operation completed with a value before the deadline.
    Success {
        name: BreakerName,
        timestamp: Instant,
        duration: Duration,
    },
    /// The operation completed with an error (or panicked) before the deadline.
    Error {
        name: BreakerName,
        timestamp: Instant,
        duration: Duration,
    },
    /// The deadline elapsed first.
    Timeout {
        name: BreakerName,
        timestamp: Instant,
        timeout: Duration,
    },
}

impl GatewayEvent for ExecutorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ExecutorEvent::Success { .. } => "success",
            ExecutorEvent::Error { .. } => "error",
            ExecutorEvent::Timeout { .. } => "timeout",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ExecutorEvent::Success { timestamp, .. }
            | ExecutorEvent::Error { timestamp, .. }
            | ExecutorEvent::Timeout { timestamp, .. } => *timestamp,
        }
    }

    fn breaker_name(&self) -> &str {
        match self {
            ExecutorEvent::Success { name, .. }
            | ExecutorEvent::Error { name, .. }
            | ExecutorEvent::Timeout { name, .. } => name.as_str(),
        }
    }
}
