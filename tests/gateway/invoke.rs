use super::{gateway, order_fallback, Unavailable, ORDER_FALLBACK};
use callguard::{CallCause, CallResult, CircuitState, Fallback};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::advance;

const COOLDOWN: Duration = Duration::from_secs(10);
const TIMEOUT: Duration = Duration::from_secs(1);

#[tokio::test(start_paused = true)]
async fn healthy_dependency_returns_its_own_value() {
    let gateway = gateway(5, COOLDOWN, TIMEOUT);

    let result = gateway
        .invoke(
            "orderService",
            || async { Ok::<_, Unavailable>("Hello from order-service!".to_string()) },
            &order_fallback(),
        )
        .await
        .unwrap();

    assert!(matches!(result, CallResult::Ok(ref body) if body == "Hello from order-service!"));
}

#[tokio::test(start_paused = true)]
async fn outage_recovery_scenario() {
    let gateway = gateway(5, COOLDOWN, TIMEOUT);
    let fallback = order_fallback();
    let attempts = Arc::new(AtomicUsize::new(0));

    let call = |healthy: bool| {
        let attempts = Arc::clone(&attempts);
        move || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if healthy {
                    Ok("Hello from order-service!".to_string())
                } else {
                    Err(Unavailable)
                }
            }
        }
    };

    // Five failures: each is substituted, the fifth opens the circuit.
    for _ in 0..5 {
        let result = gateway
            .invoke("orderService", call(false), &fallback)
            .await
            .unwrap();
        assert!(matches!(result.cause(), Some(CallCause::Failure(_))));
        assert_eq!(result.value(), ORDER_FALLBACK);
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 5);
    let breaker = gateway.registry().breaker("orderService");
    assert_eq!(breaker.state(), CircuitState::Open);

    // While open the operation never runs.
    advance(Duration::from_secs(9)).await;
    let result = gateway
        .invoke("orderService", call(true), &fallback)
        .await
        .unwrap();
    assert!(result.cause().unwrap().is_rejected());
    assert_eq!(attempts.load(Ordering::SeqCst), 5);

    // After the cooldown a trial call goes through and closes the circuit.
    advance(Duration::from_secs(1)).await;
    let result = gateway
        .invoke("orderService", call(true), &fallback)
        .await
        .unwrap();
    assert_eq!(result.into_value(), "Hello from order-service!");
    assert_eq!(attempts.load(Ordering::SeqCst), 6);
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.metrics().window_len, 0);
}

#[tokio::test(start_paused = true)]
async fn failed_trial_reopens_circuit() {
    let gateway = gateway(2, COOLDOWN, TIMEOUT);
    let fallback = order_fallback();
    for _ in 0..2 {
        gateway
            .invoke(
                "orderService",
                || async { Err::<String, _>(Unavailable) },
                &fallback,
            )
            .await
            .unwrap();
    }

    advance(COOLDOWN).await;
    let result = gateway
        .invoke(
            "orderService",
            || async { Err::<String, _>(Unavailable) },
            &fallback,
        )
        .await
        .unwrap();
    assert!(result.cause().unwrap().is_failure());
    assert!(gateway.registry().breaker("orderService").is_open());
}

#[tokio::test(start_paused = true)]
async fn fallback_sees_the_cause_and_dependency() {
    let gateway = gateway(2, COOLDOWN, TIMEOUT);
    let fallback =
        Fallback::from_cause(|name, cause| format!("{name} unavailable ({})", cause.as_str()));

    let result = gateway
        .invoke(
            "paymentService",
            || async { Err::<String, _>(Unavailable) },
            &fallback,
        )
        .await
        .unwrap();
    assert_eq!(result.value(), "paymentService unavailable (failure)");
    let err = result.cause().unwrap().error().unwrap();
    assert_eq!(err.to_string(), "503 Service Unavailable");
}

#[tokio::test(start_paused = true)]
async fn failing_fallback_surfaces_as_the_only_error() {
    let gateway = gateway(2, COOLDOWN, TIMEOUT);
    let fallback: Fallback<String> =
        Fallback::try_from_cause(|_, _| Err::<String, _>("no cached orders"));

    let err = gateway
        .invoke(
            "orderService",
            || async { Err::<String, _>(Unavailable) },
            &fallback,
        )
        .await
        .unwrap_err();

    let failed = err.as_fallback_failed().unwrap();
    assert!(failed.cause().is_failure());
    assert_eq!(failed.fallback_error().to_string(), "no cached orders");

    // The operation's failure was still recorded.
    assert_eq!(
        gateway.registry().breaker("orderService").metrics().failure_count,
        1
    );
}

#[tokio::test(start_paused = true)]
async fn dependencies_are_isolated() {
    let gateway = gateway(2, COOLDOWN, TIMEOUT);
    let fallback = order_fallback();
    for _ in 0..2 {
        gateway
            .invoke(
                "orderService",
                || async { Err::<String, _>(Unavailable) },
                &fallback,
            )
            .await
            .unwrap();
    }

    let result = gateway
        .invoke(
            "inventoryService",
            || async { Ok::<_, Unavailable>("in stock".to_string()) },
            &fallback,
        )
        .await
        .unwrap();
    assert!(!result.is_fallback());
    assert_eq!(gateway.registry().names().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn clones_share_breakers() {
    let gateway = gateway(2, COOLDOWN, TIMEOUT);
    let clone = gateway.clone();
    let fallback = order_fallback();

    for g in [&gateway, &clone] {
        g.invoke(
            "orderService",
            || async { Err::<String, _>(Unavailable) },
            &fallback,
        )
        .await
        .unwrap();
    }

    assert!(gateway.registry().breaker("orderService").is_open());
}
