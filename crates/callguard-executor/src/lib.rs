//! Deadline-bounded execution of guarded calls.
//!
//! The executor runs one operation against a deadline and classifies how it
//! ended:
//! - value before the deadline: [`Outcome::Success`]
//! - error (or panic) before the deadline: [`Outcome::Failure`]
//! - deadline first: [`Outcome::Timeout`]
//!
//! Async operations go through [`CallExecutor::execute`]; blocking closures go
//! through [`CallExecutor::execute_blocking`], which runs them on tokio's
//! blocking pool under the same deadline. Both return an [`Execution`].
//!
//! ## Example
//!
//! ```rust
//! use callguard_executor::{CallExecutor, ExecutorConfig};
//! use callguard_core::{BreakerName, Outcome};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let executor = CallExecutor::new(
//!     ExecutorConfig::builder()
//!         .timeout(Duration::from_secs(1))
//!         .on_timeout(|name| eprintln!("{name} timed out"))
//!         .build(),
//! );
//!
//! let name = BreakerName::from("orderService");
//! let execution = executor
//!     .execute(&name, async { Ok::<_, std::io::Error>("order #1") })
//!     .await;
//! assert_eq!(execution.outcome(), Outcome::Success);
//! # }
//! ```
//!
//! ## Cancellation
//!
//! With `cancel_on_timeout(true)` (the default) a late async operation is
//! dropped. With `false` it is moved onto its own task, finishes in the
//! background, and its result is discarded. A blocking closure cannot be
//! interrupted, so after a timeout its thread runs to completion unobserved.

use callguard_core::{BoxError, BreakerName, CallCause, Outcome, Panicked, SharedError};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tokio::time::{timeout, Instant};

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_histogram, histogram};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

pub use config::{ExecutorConfig, ExecutorConfigBuilder};
pub use events::ExecutorEvent;

mod config;
mod events;

/// How a single guarded operation ended.
#[derive(Debug)]
pub enum Execution<T> {
    /// The operation returned a value before the deadline.
    Success { value: T, elapsed: Duration },
    /// The operation returned an error or panicked before the deadline.
    Failure { error: SharedError, elapsed: Duration },
    /// The deadline elapsed first; no value or error is available.
    Timeout { elapsed: Duration },
}

impl<T> Execution<T> {
    /// Classification reported to the circuit breaker.
    pub fn outcome(&self) -> Outcome {
        match self {
            Execution::Success { .. } => Outcome::Success,
            Execution::Failure { .. } => Outcome::Failure,
            Execution::Timeout { .. } => Outcome::Timeout,
        }
    }

    /// Time from start until completion or deadline.
    pub fn elapsed(&self) -> Duration {
        match self {
            Execution::Success { elapsed, .. }
            | Execution::Failure { elapsed, .. }
            | Execution::Timeout { elapsed } => *elapsed,
        }
    }

    /// The value, on success.
    pub fn value(&self) -> Option<&T> {
        match self {
            Execution::Success { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The error, on failure.
    pub fn error(&self) -> Option<&SharedError> {
        match self {
            Execution::Failure { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Splits into the value or the cause a fallback would receive.
    pub fn into_result(self) -> Result<T, CallCause> {
        match self {
            Execution::Success { value, .. } => Ok(value),
            Execution::Failure { error, .. } => Err(CallCause::Failure(error)),
            Execution::Timeout { .. } => Err(CallCause::Timeout),
        }
    }
}

/// Runs guarded operations under a deadline.
///
/// Cloning is cheap; clones share configuration and listeners.
#[derive(Clone, Debug)]
pub struct CallExecutor {
    config: Arc<ExecutorConfig>,
}

impl CallExecutor {
    /// Creates an executor from a configuration.
    pub fn new(config: ExecutorConfig) -> Self {
        #[cfg(feature = "metrics")]
        {
            describe_counter!(
                "executor_calls_total",
                "Guarded calls by result (success, error, timeout)"
            );
            describe_histogram!(
                "executor_call_duration_seconds",
                "Duration of guarded calls that completed before the deadline"
            );
        }

        Self {
            config: Arc::new(config),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Drives an async operation to completion or to the deadline.
    ///
    /// A panic inside the operation is reported as a failure carrying a
    /// [`Panicked`] error.
    pub async fn execute<F, T, E>(&self, name: &BreakerName, operation: F) -> Execution<T>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        let start = Instant::now();
        let guarded = async move {
            match AssertUnwindSafe(operation).catch_unwind().await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(shared(err.into())),
                Err(payload) => Err(panicked(payload)),
            }
        };

        let completed = if self.config.cancel_on_timeout {
            timeout(self.config.timeout, guarded).await.ok()
        } else {
            // Dropping the JoinHandle on timeout detaches the task.
            timeout(self.config.timeout, tokio::spawn(guarded))
                .await
                .ok()
                .map(|joined| joined.unwrap_or_else(|err| Err(join_failure(err))))
        };

        self.finish(name, start, completed)
    }

    /// Builds the operation by calling `make` and drives it like
    /// [`execute`](Self::execute).
    ///
    /// A panic while building the future (before its first poll) is
    /// reported as a failure as well.
    pub async fn execute_with<Op, F, T, E>(&self, name: &BreakerName, make: Op) -> Execution<T>
    where
        Op: FnOnce() -> F,
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        let start = Instant::now();
        let operation = match catch_unwind(AssertUnwindSafe(make)) {
            Ok(operation) => operation,
            Err(payload) => return self.finish(name, start, Some(Err(panicked(payload)))),
        };
        self.execute(name, operation).await
    }

    /// Runs a blocking closure on the blocking pool under the deadline.
    ///
    /// On timeout the closure keeps its thread until it returns; the result
    /// is discarded.
    pub async fn execute_blocking<F, T, E>(&self, name: &BreakerName, operation: F) -> Execution<T>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let start = Instant::now();
        let handle = tokio::task::spawn_blocking(move || {
            match catch_unwind(AssertUnwindSafe(operation)) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(shared(err.into())),
                Err(payload) => Err(panicked(payload)),
            }
        });

        let completed = timeout(self.config.timeout, handle)
            .await
            .ok()
            .map(|joined| joined.unwrap_or_else(|err| Err(join_failure(err))));

        self.finish(name, start, completed)
    }

    fn finish<T>(
        &self,
        name: &BreakerName,
        start: Instant,
        completed: Option<Result<T, SharedError>>,
    ) -> Execution<T> {
        let elapsed = start.elapsed();

        match completed {
            Some(Ok(value)) => {
                self.config.event_listeners.emit(&ExecutorEvent::Success {
                    name: name.clone(),
                    timestamp: std::time::Instant::now(),
                    duration: elapsed,
                });

                #[cfg(feature = "metrics")]
                {
                    counter!("executor_calls_total", "breaker" => name.to_string(), "result" => "success").increment(1);
                    histogram!("executor_call_duration_seconds", "breaker" => name.to_string())
                        .record(elapsed.as_secs_f64());
                }

                #[cfg(feature = "tracing")]
                debug!(breaker = %name, duration_ms = elapsed.as_millis(), "guarded call succeeded");

                Execution::Success { value, elapsed }
            }
            Some(Err(error)) => {
                self.config.event_listeners.emit(&ExecutorEvent::Error {
                    name: name.clone(),
                    timestamp: std::time::Instant::now(),
                    duration: elapsed,
                });

                #[cfg(feature = "metrics")]
                {
                    counter!("executor_calls_total", "breaker" => name.to_string(), "result" => "error").increment(1);
                    histogram!("executor_call_duration_seconds", "breaker" => name.to_string())
                        .record(elapsed.as_secs_f64());
                }

                #[cfg(feature = "tracing")]
                debug!(breaker = %name, duration_ms = elapsed.as_millis(), error = %error, "guarded call failed");

                Execution::Failure { error, elapsed }
            }
            None => {
                self.config.event_listeners.emit(&ExecutorEvent::Timeout {
                    name: name.clone(),
                    timestamp: std::time::Instant::now(),
                    timeout: self.config.timeout,
                });

                #[cfg(feature = "metrics")]
                counter!("executor_calls_total", "breaker" => name.to_string(), "result" => "timeout").increment(1);

                #[cfg(feature = "tracing")]
                warn!(
                    breaker = %name,
                    timeout_ms = self.config.timeout.as_millis(),
                    "guarded call timed out"
                );

                Execution::Timeout { elapsed }
            }
        }
    }
}

impl Default for CallExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

fn shared(err: BoxError) -> SharedError {
    Arc::from(err)
}

fn panicked(payload: Box<dyn Any + Send>) -> SharedError {
    Arc::new(Panicked::from_payload("operation", payload))
}

fn join_failure(err: JoinError) -> SharedError {
    if err.is_panic() {
        panicked(err.into_panic())
    } else {
        Arc::new(err)
    }
}
