//! Substitute values for guarded calls that could not produce a real result.
//!
//! A [`Fallback`] is supplied per call site. The gateway resolves it with the
//! dependency name and the [`CallCause`]: the breaker rejected the call, the
//! operation failed, or the operation timed out.
//!
//! # Strategies
//!
//! ## Static Value
//!
//! ```rust
//! use callguard_fallback::Fallback;
//! use callguard_core::{BreakerName, CallCause};
//!
//! let fallback = Fallback::value("Fallback: Order service is unavailable".to_string());
//! let value = fallback
//!     .resolve(&BreakerName::from("orderService"), CallCause::Rejected)
//!     .unwrap();
//! assert_eq!(value, "Fallback: Order service is unavailable");
//! ```
//!
//! ## Computed From the Cause
//!
//! ```rust
//! use callguard_fallback::Fallback;
//!
//! let fallback = Fallback::from_cause(|name, cause| format!("{name} unavailable: {cause}"));
//! ```
//!
//! ## Fallible
//!
//! A fallback that may itself fail. Its error, like a panic inside any
//! strategy, surfaces as [`FallbackFailed`] and is never swallowed.
//!
//! ```rust
//! use callguard_fallback::Fallback;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let cache: Arc<HashMap<String, String>> = Arc::new(HashMap::new());
//! let fallback = Fallback::try_from_cause(move |name, _cause| {
//!     cache
//!         .get(name.as_str())
//!         .cloned()
//!         .ok_or_else(|| format!("no cached response for {name}"))
//! });
//! ```
//!
//! # Events
//!
//! - `Applied`: a substitute value was produced
//! - `Failed`: the fallback returned an error or panicked

mod error;
mod events;

pub use error::FallbackFailed;
pub use events::FallbackEvent;

use callguard_core::{
    BoxError, BreakerName, CallCause, EventListeners, FnListener, Panicked, SharedError,
};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};

#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Function producing a fallback value from the dependency name and cause.
pub type FromCauseFn<T> = Arc<dyn Fn(&BreakerName, &CallCause) -> T + Send + Sync>;

/// Fallible variant of [`FromCauseFn`].
pub type TryFromCauseFn<T> =
    Arc<dyn Fn(&BreakerName, &CallCause) -> Result<T, BoxError> + Send + Sync>;

enum Strategy<T> {
    Value(Arc<dyn Fn() -> T + Send + Sync>),
    FromCause(FromCauseFn<T>),
    TryFromCause(TryFromCauseFn<T>),
}

impl<T> Strategy<T> {
    fn name(&self) -> &'static str {
        match self {
            Strategy::Value(_) => "value",
            Strategy::FromCause(_) => "from_cause",
            Strategy::TryFromCause(_) => "try_from_cause",
        }
    }
}

impl<T> Clone for Strategy<T> {
    fn clone(&self) -> Self {
        match self {
            Strategy::Value(f) => Strategy::Value(Arc::clone(f)),
            Strategy::FromCause(f) => Strategy::FromCause(Arc::clone(f)),
            Strategy::TryFromCause(f) => Strategy::TryFromCause(Arc::clone(f)),
        }
    }
}

/// Produces a substitute value when a guarded call has no real result.
///
/// Cloning is cheap; clones share the strategy and listeners.
pub struct Fallback<T> {
    strategy: Strategy<T>,
    event_listeners: EventListeners<FallbackEvent>,
}

impl<T> Fallback<T> {
    fn with_strategy(strategy: Strategy<T>) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "fallback_calls_total",
                "Fallback resolutions by result (applied, failed)"
            );
        });

        Self {
            strategy,
            event_listeners: EventListeners::new(),
        }
    }

    /// Always returns a clone of `value`.
    pub fn value(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self::with_strategy(Strategy::Value(Arc::new(move || value.clone())))
    }

    /// Computes the value from the dependency name and the cause.
    pub fn from_cause<F>(f: F) -> Self
    where
        F: Fn(&BreakerName, &CallCause) -> T + Send + Sync + 'static,
    {
        Self::with_strategy(Strategy::FromCause(Arc::new(f)))
    }

    /// Computes the value, or fails with an error that is propagated to the
    /// caller as [`FallbackFailed`].
    pub fn try_from_cause<F, E>(f: F) -> Self
    where
        F: Fn(&BreakerName, &CallCause) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::with_strategy(Strategy::TryFromCause(Arc::new(move |name, cause| {
            f(name, cause).map_err(Into::into)
        })))
    }

    /// Registers a listener receiving every fallback event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&FallbackEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    /// Registers a callback for each substituted value, with the name and cause label.
    pub fn on_applied<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &'static str) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &FallbackEvent| {
                if let FallbackEvent::Applied { name, cause, .. } = event {
                    f(name.as_str(), cause);
                }
            }));
        self
    }

    /// Registers a callback for fallbacks that failed.
    pub fn on_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &FallbackEvent| {
                if let FallbackEvent::Failed { name, .. } = event {
                    f(name.as_str());
                }
            }));
        self
    }

    /// Name of the configured strategy.
    pub fn strategy(&self) -> &'static str {
        self.strategy.name()
    }

    /// Produces the substitute value for `name`, which could not be reached
    /// because of `cause`.
    pub fn resolve(&self, name: &BreakerName, cause: CallCause) -> Result<T, FallbackFailed> {
        let attempt = catch_unwind(AssertUnwindSafe(|| match &self.strategy {
            Strategy::Value(f) => Ok(f()),
            Strategy::FromCause(f) => Ok(f(name, &cause)),
            Strategy::TryFromCause(f) => f(name, &cause).map_err(SharedError::from),
        }));

        let result = match attempt {
            Ok(result) => result,
            Err(payload) => Err(Arc::new(Panicked::from_payload("fallback", payload)) as SharedError),
        };

        match result {
            Ok(value) => {
                self.event_listeners.emit(&FallbackEvent::Applied {
                    name: name.clone(),
                    timestamp: Instant::now(),
                    cause: cause.as_str(),
                    strategy: self.strategy.name(),
                });

                #[cfg(feature = "metrics")]
                counter!(
                    "fallback_calls_total",
                    "breaker" => name.to_string(),
                    "result" => "applied",
                    "cause" => cause.as_str()
                )
                .increment(1);

                #[cfg(feature = "tracing")]
                tracing::warn!(breaker = %name, cause = %cause, "serving fallback value");

                Ok(value)
            }
            Err(source) => {
                self.event_listeners.emit(&FallbackEvent::Failed {
                    name: name.clone(),
                    timestamp: Instant::now(),
                    cause: cause.as_str(),
                    strategy: self.strategy.name(),
                });

                #[cfg(feature = "metrics")]
                counter!(
                    "fallback_calls_total",
                    "breaker" => name.to_string(),
                    "result" => "failed",
                    "cause" => cause.as_str()
                )
                .increment(1);

                #[cfg(feature = "tracing")]
                tracing::error!(breaker = %name, cause = %cause, error = %source, "fallback failed");

                Err(FallbackFailed::new(name.clone(), cause, source))
            }
        }
    }
}

impl<T> Clone for Fallback<T> {
    fn clone(&self) -> Self {
        Self {
            strategy: self.strategy.clone(),
            event_listeners: self.event_listeners.clone(),
        }
    }
}

impl<T> fmt::Debug for Fallback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fallback")
            .field("strategy", &self.strategy.name())
            .field("listeners", &self.event_listeners.len())
            .finish()
    }
}
