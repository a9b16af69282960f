//! Configuration for the call executor.

use crate::events::ExecutorEvent;
use callguard_core::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for the call executor.
#[derive(Clone, Debug)]
pub struct ExecutorConfig {
    pub(crate) timeout: Duration,
    pub(crate) cancel_on_timeout: bool,
    pub(crate) event_listeners: EventListeners<ExecutorEvent>,
}

impl ExecutorConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::new()
    }

    /// Deadline applied to every call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a timed-out async operation is dropped rather than detached.
    pub fn cancel_on_timeout(&self) -> bool {
        self.cancel_on_timeout
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfigBuilder::new().build()
    }
}

/// Builder for [`ExecutorConfig`].
pub struct ExecutorConfigBuilder {
    timeout: Duration,
    cancel_on_timeout: bool,
    event_listeners: EventListeners<ExecutorEvent>,
}

impl ExecutorConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            cancel_on_timeout: true,
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the per-call deadline.
    ///
    /// Default: 1 second
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets what happens to an async operation that misses its deadline.
    ///
    /// When true, the operation's future is dropped, cancelling it at its
    /// next await point. When false, the operation keeps running as a
    /// detached task and its eventual result is discarded. Blocking
    /// operations cannot be interrupted either way.
    ///
    /// Default: true
    pub fn cancel_on_timeout(mut self, cancel: bool) -> Self {
        self.cancel_on_timeout = cancel;
        self
    }

    /// Registers a callback for operations that return a value in time.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Duration) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &ExecutorEvent| {
                if let ExecutorEvent::Success { name, duration, .. } = event {
                    f(name.as_str(), *duration);
                }
            }));
        self
    }

    /// Registers a callback for operations that fail in time.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Duration) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &ExecutorEvent| {
                if let ExecutorEvent::Error { name, duration, .. } = event {
                    f(name.as_str(), *duration);
                }
            }));
        self
    }

    /// Registers a callback for operations that miss the deadline.
    pub fn on_timeout<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &ExecutorEvent| {
                if let ExecutorEvent::Timeout { name, .. } = event {
                    f(name.as_str());
                }
            }));
        self
    }

    /// Registers a listener receiving every executor event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&ExecutorEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ExecutorConfig {
        ExecutorConfig {
            timeout: self.timeout,
            cancel_on_timeout: self.cancel_on_timeout,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for ExecutorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
