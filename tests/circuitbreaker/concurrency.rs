use super::{breaker_with, drive};
use callguard_circuitbreaker::CircuitState;
use callguard_core::Outcome::{self, Failure as F, Success as S};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn concurrent_half_open_requests_get_exactly_max_trial_permits() {
    for max_trials in [1, 2, 5] {
        let breaker = breaker_with(4, 4, Duration::ZERO, max_trials);
        drive(&breaker, &[F, F, F, F]);
        assert_eq!(breaker.state(), CircuitState::Open);

        let callers = max_trials * 4 + 1;
        let barrier = Arc::new(Barrier::new(callers));
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let breaker = Arc::clone(&breaker);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    breaker.allow().ok()
                })
            })
            .collect();

        // Keep the permits alive until every caller has asked.
        let permits: Vec<_> = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .collect();

        assert_eq!(permits.len(), max_trials, "max_trial_calls = {max_trials}");
        assert!(permits.iter().all(|p| p.is_trial()));
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }
}

#[test]
fn concurrent_outcomes_are_all_counted() {
    let breaker = breaker_with(1000, 1000, Duration::from_secs(10), 1);

    thread::scope(|scope| {
        for worker in 0..8 {
            let breaker = &breaker;
            scope.spawn(move || {
                for i in 0..100 {
                    let outcome = if (worker + i) % 4 == 0 { F } else { S };
                    breaker.allow().unwrap().record(outcome);
                }
            });
        }
    });

    let metrics = breaker.metrics();
    assert_eq!(metrics.window_len, 800);
    assert_eq!(metrics.failure_count, 200);
    assert_eq!(metrics.state, CircuitState::Closed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn breakers_for_different_names_do_not_interfere() {
    let registry = Arc::new(callguard_circuitbreaker::BreakerRegistry::default());

    let failing = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            for _ in 0..50 {
                if let Ok(permit) = registry.allow("orderService") {
                    permit.record(Outcome::Failure);
                }
                tokio::task::yield_now().await;
            }
        })
    };
    let healthy = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            for _ in 0..50 {
                registry.allow("paymentService").unwrap().record(S);
                tokio::task::yield_now().await;
            }
        })
    };

    failing.await.unwrap();
    healthy.await.unwrap();

    assert!(registry.breaker("orderService").is_open());
    assert_eq!(
        registry.breaker("paymentService").state(),
        CircuitState::Closed
    );
    assert!(registry.any_open());
}
