use crate::config::{ServiceResolver, ORDER_BREAKER, ORDER_SERVICE};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use callguard::{core::BoxError, CallResult, Fallback, Gateway};
use std::sync::Arc;

pub const ORDER_FALLBACK: &str = "Fallback: Order service is unavailable";

#[derive(Clone)]
pub struct AppState {
    gateway: Gateway,
    client: reqwest::Client,
    resolver: Arc<ServiceResolver>,
    order_path: Arc<str>,
    order_fallback: Fallback<String>,
}

impl AppState {
    pub fn new(
        gateway: Gateway,
        client: reqwest::Client,
        resolver: ServiceResolver,
        order_path: &str,
    ) -> Self {
        Self {
            gateway,
            client,
            resolver: Arc::new(resolver),
            order_path: Arc::from(order_path),
            order_fallback: Fallback::value(ORDER_FALLBACK.to_string()),
        }
    }

    /// Replaces the fallback served when the order call is not answered.
    pub fn with_fallback(mut self, fallback: Fallback<String>) -> Self {
        self.order_fallback = fallback;
        self
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/user/order", get(user_order))
        .route("/user/hello", get(hello))
        .route("/health", get(health))
        .with_state(state)
}

/// Fetches the order greeting through the gateway.
///
/// Answers 200 with either the real body or the fallback text; 500 only if
/// the fallback itself fails.
async fn user_order(State(state): State<AppState>) -> Response {
    let url = state.resolver.url(ORDER_SERVICE, &state.order_path);
    let client = state.client.clone();

    let result = state
        .gateway
        .invoke(
            ORDER_BREAKER,
            move || async move {
                let response = client.get(url?).send().await?.error_for_status()?;
                Ok::<_, BoxError>(response.text().await?)
            },
            &state.order_fallback,
        )
        .await;

    match result {
        Ok(CallResult::Ok(body)) => (StatusCode::OK, body).into_response(),
        Ok(CallResult::Fallback { value, cause }) => {
            tracing::warn!(%cause, "order-service call replaced by fallback");
            (StatusCode::OK, value).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "order-service fallback failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

async fn hello() -> &'static str {
    "Hello from User Service!"
}

/// Breaker snapshot; 503 while any circuit is open.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.gateway.registry();
    let breakers: serde_json::Map<String, serde_json::Value> = registry
        .snapshot()
        .into_iter()
        .map(|(name, metrics)| {
            let health = registry
                .get(name.as_str())
                .map(|breaker| breaker.health_status())
                .unwrap_or("unknown");
            (
                name.to_string(),
                serde_json::json!({
                    "health": health,
                    "metrics": metrics,
                }),
            )
        })
        .collect();

    let (status, label) = if registry.any_open() {
        (StatusCode::SERVICE_UNAVAILABLE, "DEGRADED")
    } else {
        (StatusCode::OK, "UP")
    };

    (
        status,
        Json(serde_json::json!({
            "status": label,
            "breakers": breakers,
        })),
    )
}
