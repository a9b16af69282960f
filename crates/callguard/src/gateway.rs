use crate::config::{ConfigError, GatewayConfig};
use crate::{CallResult, GatewayError};
use callguard_circuitbreaker::{BreakerRegistry, CircuitBreaker};
use callguard_core::{BoxError, CallCause};
use callguard_executor::{CallExecutor, Execution};
use callguard_fallback::Fallback;
use std::future::Future;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Single entry point for guarded calls.
///
/// Cloning is cheap; clones share the breaker registry and the executor, so
/// a gateway can be handed to request handlers as shared state.
#[derive(Clone, Debug)]
pub struct Gateway {
    registry: Arc<BreakerRegistry>,
    executor: CallExecutor,
}

impl Gateway {
    /// Creates a gateway from a registry and an executor.
    pub fn new(registry: BreakerRegistry, executor: CallExecutor) -> Self {
        Self {
            registry: Arc::new(registry),
            executor,
        }
    }

    /// Builds the registry and executor described by `config`.
    ///
    /// Dependencies listed under `breakers` are registered up front with
    /// their overrides; any other name gets a breaker from the defaults on
    /// first use.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        if config.call_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        let registry = BreakerRegistry::new(config.default_breaker_config()?);
        for name in config.breakers.keys() {
            registry.register(name.as_str(), config.breaker_config(name)?);
        }

        Ok(Self::new(registry, CallExecutor::new(config.executor_config())))
    }

    /// Breaker registry, for health reporting and operator control.
    pub fn registry(&self) -> &BreakerRegistry {
        &self.registry
    }

    /// Executor applying the call deadline.
    pub fn executor(&self) -> &CallExecutor {
        &self.executor
    }

    /// Runs `operation` against the dependency `name`.
    ///
    /// 1. If the breaker rejects the call, `operation` is never invoked and
    ///    the fallback value is returned with [`CallCause::Rejected`].
    /// 2. Otherwise the operation runs under the call deadline and its
    ///    outcome is reported to the breaker.
    /// 3. A value is returned as [`CallResult::Ok`]; an error, panic or
    ///    timeout is replaced by the fallback value. This includes a panic
    ///    raised by `operation` itself while building its future.
    ///
    /// Only a failing fallback produces an `Err`.
    pub async fn invoke<Op, Fut, T, E>(
        &self,
        name: &str,
        operation: Op,
        fallback: &Fallback<T>,
    ) -> Result<CallResult<T>, GatewayError>
    where
        Op: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        let breaker = self.registry.breaker(name);
        let permit = match breaker.allow() {
            Ok(permit) => permit,
            Err(_rejected) => {
                #[cfg(feature = "tracing")]
                debug!(breaker = %breaker.name(), state = %_rejected.state(), "call rejected");

                return substitute(&breaker, CallCause::Rejected, fallback);
            }
        };

        let execution = self.executor.execute_with(breaker.name(), operation).await;
        permit.record(execution.outcome());
        settle(&breaker, execution, fallback)
    }

    /// Same contract as [`invoke`](Self::invoke) for a blocking closure,
    /// which runs on the blocking thread pool.
    pub async fn invoke_blocking<Op, T, E>(
        &self,
        name: &str,
        operation: Op,
        fallback: &Fallback<T>,
    ) -> Result<CallResult<T>, GatewayError>
    where
        Op: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let breaker = self.registry.breaker(name);
        let permit = match breaker.allow() {
            Ok(permit) => permit,
            Err(_rejected) => {
                #[cfg(feature = "tracing")]
                debug!(breaker = %breaker.name(), state = %_rejected.state(), "call rejected");

                return substitute(&breaker, CallCause::Rejected, fallback);
            }
        };

        let execution = self
            .executor
            .execute_blocking(breaker.name(), operation)
            .await;
        permit.record(execution.outcome());
        settle(&breaker, execution, fallback)
    }
}

impl Default for Gateway {
    /// Default breaker settings and a one second call timeout.
    fn default() -> Self {
        Self::new(BreakerRegistry::default(), CallExecutor::default())
    }
}

fn settle<T>(
    breaker: &CircuitBreaker,
    execution: Execution<T>,
    fallback: &Fallback<T>,
) -> Result<CallResult<T>, GatewayError> {
    match execution.into_result() {
        Ok(value) => Ok(CallResult::Ok(value)),
        Err(cause) => substitute(breaker, cause, fallback),
    }
}

fn substitute<T>(
    breaker: &CircuitBreaker,
    cause: CallCause,
    fallback: &Fallback<T>,
) -> Result<CallResult<T>, GatewayError> {
    let value = fallback.resolve(breaker.name(), cause.clone())?;
    Ok(CallResult::Fallback { value, cause })
}
