//! Guarded inter-service calls.
//!
//! `callguard` protects a service from slow or failing dependencies. Every
//! call to a dependency goes through one [`Gateway::invoke`], which combines:
//!
//! - a per-dependency **circuit breaker** that stops calling a dependency
//!   once too many recent calls failed, and tries it again after a cooldown
//! - a **call timeout** bounding how long one call may take
//! - a **fallback** that substitutes a value whenever the real call is
//!   rejected, fails or times out
//!
//! # Example
//!
//! ```rust
//! use callguard::{CallResult, Fallback, Gateway, GatewayConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::from_toml_str(r#"
//!     failureRateThreshold = 50
//!     openCooldown = "10s"
//!     callTimeout = "1s"
//! "#)?;
//! let gateway = Gateway::from_config(&config)?;
//! let fallback = Fallback::value("Fallback: Order service is unavailable".to_string());
//!
//! let result = gateway
//!     .invoke(
//!         "orderService",
//!         || async { Ok::<_, std::io::Error>("Hello from order-service!".to_string()) },
//!         &fallback,
//!     )
//!     .await?;
//!
//! match result {
//!     CallResult::Ok(body) => println!("{body}"),
//!     CallResult::Fallback { value, cause } => println!("{value} ({cause})"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! Rejections, failures and timeouts never surface as errors; they become
//! [`CallResult::Fallback`]. The only error is [`GatewayError::FallbackFailed`].
//!
//! # Component Crates
//!
//! - `callguard-core`: outcomes, causes, names and the event system
//! - `callguard-circuitbreaker`: breaker state machine and registry
//! - `callguard-executor`: deadline-bounded execution, async or blocking
//! - `callguard-fallback`: fallback strategies
//!
//! # Feature Flags
//! - `tracing`: log permit decisions, transitions, timeouts and fallbacks
//! - `metrics`: counters, gauges and histograms via the `metrics` crate
//! - `serde`: serialize breaker state snapshots

mod config;
mod error;
mod gateway;
mod layer;
mod result;

pub use config::{BreakerOverrides, ConfigError, GatewayConfig};
pub use error::GatewayError;
pub use gateway::Gateway;
pub use layer::{GuardLayer, Guarded};
pub use result::CallResult;

pub use callguard_circuitbreaker::{
    BreakerRegistry, CircuitBreaker, CircuitBreakerConfig, CircuitMetrics, CircuitState, Permit,
    Rejected,
};
pub use callguard_core::{BreakerName, CallCause, Outcome, Panicked};
pub use callguard_executor::{CallExecutor, Execution, ExecutorConfig};
pub use callguard_fallback::{Fallback, FallbackFailed};

// Component crates, for events and builders not re-exported above.
pub use callguard_circuitbreaker as circuitbreaker;
pub use callguard_core as core;
pub use callguard_executor as executor;
pub use callguard_fallback as fallback;
