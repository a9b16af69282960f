use super::{breaker_with, drive};
use callguard_circuitbreaker::{CircuitBreakerConfig, CircuitState};
use callguard_core::Outcome::{Failure as F, Success as S};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::advance;

#[test]
fn reset_closes_an_open_circuit() {
    let breaker = breaker_with(5, 5, Duration::from_secs(60), 1);
    drive(&breaker, &[F, F, F, F, F]);
    assert!(breaker.is_open());

    breaker.reset();
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.health_status(), "healthy");
    assert!(breaker.allow().is_ok());
}

#[test]
fn reset_clears_the_window() {
    let breaker = breaker_with(5, 5, Duration::from_secs(60), 1);
    drive(&breaker, &[F, F, F, S]);

    breaker.reset();
    assert_eq!(breaker.metrics().window_len, 0);
}

#[tokio::test(start_paused = true)]
async fn reset_from_half_open_invalidates_trial_permits() {
    let breaker = breaker_with(5, 5, Duration::from_secs(10), 1);
    drive(&breaker, &[F, F, F, F, F]);
    advance(Duration::from_secs(10)).await;

    let trial = breaker.allow().unwrap();
    breaker.reset();
    assert_eq!(breaker.state(), CircuitState::Closed);

    drop(trial);
    assert_eq!(breaker.metrics().trial_calls, 0);
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[test]
fn reset_emits_a_transition_only_when_state_changes() {
    let transitions = Arc::new(AtomicUsize::new(0));
    let t = Arc::clone(&transitions);
    let config = CircuitBreakerConfig::builder()
        .sliding_window_size(2)
        .minimum_sample_size(2)
        .on_state_transition(move |_, _, _| {
            t.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();
    let breaker = Arc::new(callguard_circuitbreaker::CircuitBreaker::new(
        "orderService",
        config,
    ));

    breaker.reset();
    assert_eq!(transitions.load(Ordering::SeqCst), 0);

    drive(&breaker, &[F, F]);
    breaker.reset();
    assert_eq!(transitions.load(Ordering::SeqCst), 2);
}
