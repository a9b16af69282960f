//! Events emitted when a fallback is resolved.

use callguard_core::{BreakerName, GatewayEvent};
use std::time::Instant;

/// Events emitted when a fallback is resolved.
#[derive(Debug, Clone)]
pub enum FallbackEvent {
    /// A substitute value was produced.
    Applied {
        /// Dependency whose call was replaced.
        name: BreakerName,
        /// When the event occurred.
        timestamp: Instant,
        /// Why the real result was unavailable ("rejected", "failure", "timeout").
        cause: &'static str,
        /// The strategy that produced the value.
        strategy: &'static str,
    },

    /// The fallback itself returned an error or panicked.
    Failed {
        /// Dependency whose call was being replaced.
        name: BreakerName,
        /// When the event occurred.
        timestamp: Instant,
        /// Why the real result was unavailable.
        cause: &'static str,
        /// The strategy that failed.
        strategy: &'static str,
    },
}

impl GatewayEvent for FallbackEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::Failed { .. } => "failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::Applied { timestamp, .. } | Self::Failed { timestamp, .. } => *timestamp,
        }
    }

    fn breaker_name(&self) -> &str {
        match self {
            Self::Applied { name, .. } | Self::Failed { name, .. } => name.as_str(),
        }
    }
}
