use super::{gateway, order_fallback, ORDER_FALLBACK};
use callguard::{BreakerRegistry, CallExecutor, CircuitState, ExecutorConfig, Gateway};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const COOLDOWN: Duration = Duration::from_secs(10);
const TIMEOUT: Duration = Duration::from_secs(1);

struct SetOnDrop(Arc<AtomicBool>);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::test(start_paused = true)]
async fn slow_call_times_out_at_the_deadline() {
    let gateway = gateway(5, COOLDOWN, TIMEOUT);
    let start = Instant::now();

    let result = gateway
        .invoke(
            "orderService",
            || async {
                sleep(Duration::from_secs(30)).await;
                Ok::<_, std::io::Error>("too late".to_string())
            },
            &order_fallback(),
        )
        .await
        .unwrap();

    let elapsed = start.elapsed();
    assert!(elapsed >= TIMEOUT && elapsed < Duration::from_secs(2), "{elapsed:?}");
    assert!(result.cause().unwrap().is_timeout());
    assert_eq!(result.into_value(), ORDER_FALLBACK);
}

#[tokio::test(start_paused = true)]
async fn call_finishing_before_deadline_is_a_success() {
    let gateway = gateway(5, COOLDOWN, TIMEOUT);

    let result = gateway
        .invoke(
            "orderService",
            || async {
                sleep(Duration::from_millis(999)).await;
                Ok::<_, std::io::Error>("just in time".to_string())
            },
            &order_fallback(),
        )
        .await
        .unwrap();

    assert!(!result.is_fallback());
}

#[tokio::test(start_paused = true)]
async fn timeouts_open_the_circuit() {
    let gateway = gateway(2, COOLDOWN, TIMEOUT);
    let fallback = order_fallback();

    for _ in 0..2 {
        gateway
            .invoke(
                "orderService",
                || async {
                    sleep(Duration::from_secs(5)).await;
                    Ok::<_, std::io::Error>(String::new())
                },
                &fallback,
            )
            .await
            .unwrap();
    }

    let breaker = gateway.registry().breaker("orderService");
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn timed_out_operation_is_cancelled_by_default() {
    let gateway = gateway(5, COOLDOWN, TIMEOUT);
    let dropped = Arc::new(AtomicBool::new(false));
    let finished = Arc::new(AtomicBool::new(false));
    let (d, f) = (Arc::clone(&dropped), Arc::clone(&finished));

    gateway
        .invoke(
            "orderService",
            move || async move {
                let _guard = SetOnDrop(d);
                sleep(Duration::from_secs(5)).await;
                f.store(true, Ordering::SeqCst);
                Ok::<_, std::io::Error>(String::new())
            },
            &order_fallback(),
        )
        .await
        .unwrap();

    assert!(dropped.load(Ordering::SeqCst));
    sleep(Duration::from_secs(10)).await;
    assert!(!finished.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn detached_operation_runs_to_completion() {
    let gateway = Gateway::new(
        BreakerRegistry::default(),
        CallExecutor::new(
            ExecutorConfig::builder()
                .timeout(TIMEOUT)
                .cancel_on_timeout(false)
                .build(),
        ),
    );
    let finished = Arc::new(AtomicBool::new(false));
    let f = Arc::clone(&finished);

    let result = gateway
        .invoke(
            "orderService",
            move || async move {
                sleep(Duration::from_secs(3)).await;
                f.store(true, Ordering::SeqCst);
                Ok::<_, std::io::Error>("discarded".to_string())
            },
            &order_fallback(),
        )
        .await
        .unwrap();

    assert!(result.cause().unwrap().is_timeout());
    assert!(!finished.load(Ordering::SeqCst));

    sleep(Duration::from_secs(5)).await;
    assert!(finished.load(Ordering::SeqCst));

    // The late completion is not reported to the breaker.
    let metrics = gateway.registry().breaker("orderService").metrics();
    assert_eq!((metrics.failure_count, metrics.success_count), (1, 0));
}

#[tokio::test]
async fn blocking_call_is_bounded_by_the_deadline() {
    let gateway = gateway(5, COOLDOWN, Duration::from_millis(50));
    let runs = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&runs);

    let result = gateway
        .invoke_blocking(
            "reportService",
            move || {
                r.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(300));
                Ok::<_, std::io::Error>("report".to_string())
            },
            &order_fallback(),
        )
        .await
        .unwrap();

    assert!(result.cause().unwrap().is_timeout());
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn blocking_call_result_is_returned() {
    let gateway = gateway(5, COOLDOWN, Duration::from_secs(5));

    let result = gateway
        .invoke_blocking(
            "reportService",
            || Ok::<_, std::io::Error>(21 * 2),
            &callguard::Fallback::value(0),
        )
        .await
        .unwrap();

    assert_eq!(result.into_value(), 42);
}
