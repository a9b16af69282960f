use super::{breaker_with, drive};
use callguard_circuitbreaker::CircuitState;
use callguard_core::Outcome::{Failure as F, Success as S};
use std::time::Duration;
use tokio::time::advance;

#[tokio::test(start_paused = true)]
async fn rejects_until_cooldown_has_elapsed() {
    let breaker = breaker_with(5, 5, Duration::from_secs(10), 1);
    drive(&breaker, &[F, F, F, F, F]);
    assert_eq!(breaker.state(), CircuitState::Open);

    advance(Duration::from_millis(9_999)).await;
    let rejected = breaker.allow().unwrap_err();
    assert_eq!(rejected.state(), CircuitState::Open);
    assert_eq!(rejected.name().as_str(), "orderService");

    advance(Duration::from_millis(1)).await;
    let permit = breaker.allow().unwrap();
    assert!(permit.is_trial());
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
    permit.record(S);
}

#[tokio::test(start_paused = true)]
async fn open_to_half_open_waits_for_a_request() {
    let breaker = breaker_with(5, 5, Duration::from_secs(10), 1);
    drive(&breaker, &[F, F, F, F, F]);

    advance(Duration::from_secs(60)).await;
    assert_eq!(breaker.state(), CircuitState::Open);
    assert_eq!(breaker.http_status(), 503);

    let _permit = breaker.allow().unwrap();
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
    assert_eq!(breaker.http_status(), 200);
    assert_eq!(breaker.health_status(), "degraded");
}

#[tokio::test(start_paused = true)]
async fn rejections_do_not_extend_the_cooldown() {
    let breaker = breaker_with(5, 5, Duration::from_secs(10), 1);
    drive(&breaker, &[F, F, F, F, F]);

    for _ in 0..9 {
        advance(Duration::from_secs(1)).await;
        assert!(breaker.allow().is_err());
    }

    advance(Duration::from_secs(1)).await;
    assert!(breaker.allow().is_ok());
}

#[tokio::test(start_paused = true)]
async fn time_since_state_change_tracks_the_clock() {
    let breaker = breaker_with(5, 5, Duration::from_secs(10), 1);
    drive(&breaker, &[F, F, F, F, F]);

    advance(Duration::from_secs(4)).await;
    assert_eq!(
        breaker.metrics().time_since_state_change,
        Duration::from_secs(4)
    );
}

#[tokio::test(start_paused = true)]
async fn zero_cooldown_allows_an_immediate_trial() {
    let breaker = breaker_with(2, 2, Duration::ZERO, 1);
    drive(&breaker, &[F, F]);
    assert_eq!(breaker.state(), CircuitState::Open);

    let permit = breaker.allow().unwrap();
    assert!(permit.is_trial());
    permit.record(F);
    assert_eq!(breaker.state(), CircuitState::Open);
}
