//! Tower adapter routing every request of a service through a [`Gateway`].

use crate::{CallResult, Gateway, GatewayError};
use callguard_core::{BoxError, BreakerName};
use callguard_fallback::Fallback;
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower::{Layer, Service, ServiceExt};

/// Wraps a service so that each call is guarded under a fixed dependency name.
///
/// ```rust
/// use callguard::{Fallback, Gateway, GuardLayer};
/// use tower::{service_fn, Layer};
///
/// let gateway = Gateway::default();
/// let layer = GuardLayer::new(
///     gateway,
///     "orderService",
///     Fallback::value("Fallback: Order service is unavailable".to_string()),
/// );
/// let service = layer.layer(service_fn(|path: String| async move {
///     Ok::<_, std::io::Error>(format!("GET {path}"))
/// }));
/// ```
pub struct GuardLayer<T> {
    gateway: Gateway,
    name: BreakerName,
    fallback: Fallback<T>,
}

impl<T> GuardLayer<T> {
    /// Creates a layer guarding calls to `name` with `fallback`.
    pub fn new(gateway: Gateway, name: impl Into<BreakerName>, fallback: Fallback<T>) -> Self {
        Self {
            gateway,
            name: name.into(),
            fallback,
        }
    }
}

impl<T> Clone for GuardLayer<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            name: self.name.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

impl<S, T> Layer<S> for GuardLayer<T> {
    type Service = Guarded<S, T>;

    fn layer(&self, inner: S) -> Self::Service {
        Guarded {
            inner,
            gateway: self.gateway.clone(),
            name: self.name.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

/// Service produced by [`GuardLayer`].
///
/// Always ready: the inner service's readiness is awaited inside the guarded
/// operation, so a readiness error counts as a failure of the dependency.
pub struct Guarded<S, T> {
    inner: S,
    gateway: Gateway,
    name: BreakerName,
    fallback: Fallback<T>,
}

impl<S: Clone, T> Clone for Guarded<S, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            gateway: self.gateway.clone(),
            name: self.name.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

impl<S, Req> Service<Req> for Guarded<S, S::Response>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Into<BoxError> + Send + 'static,
    Req: Send + 'static,
{
    type Response = CallResult<S::Response>;
    type Error = GatewayError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let inner = self.inner.clone();
        let gateway = self.gateway.clone();
        let name = self.name.clone();
        let fallback = self.fallback.clone();

        Box::pin(async move {
            gateway
                .invoke(name.as_str(), move || inner.oneshot(req), &fallback)
                .await
        })
    }
}
