use callguard_circuitbreaker::{BreakerRegistry, CircuitBreakerConfig, CircuitState};
use callguard_core::{BreakerName, Outcome};
use std::sync::Arc;
use std::time::Duration;

fn registry() -> BreakerRegistry {
    BreakerRegistry::new(
        CircuitBreakerConfig::builder()
            .sliding_window_size(2)
            .minimum_sample_size(2)
            .build()
            .unwrap(),
    )
}

#[test]
fn breakers_are_created_once_per_name() {
    let registry = registry();
    assert!(registry.is_empty());

    let first = registry.breaker("orderService");
    let again = registry.breaker("orderService");
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(registry.len(), 1);
    assert!(registry.get("paymentService").is_none());
}

#[test]
fn one_failing_dependency_does_not_open_another() {
    let registry = registry();
    registry.on_outcome("orderService", Outcome::Failure);
    registry.on_outcome("orderService", Outcome::Failure);
    registry.on_outcome("paymentService", Outcome::Success);

    assert!(registry.allow("orderService").is_err());
    assert!(registry.allow("paymentService").is_ok());
    assert!(registry.any_open());
}

#[test]
fn registered_configuration_overrides_default() {
    let registry = registry();
    registry.register(
        "orderService",
        CircuitBreakerConfig::builder()
            .sliding_window_size(20)
            .minimum_sample_size(20)
            .open_cooldown(Duration::from_secs(30))
            .build()
            .unwrap(),
    );

    for _ in 0..5 {
        registry.on_outcome("orderService", Outcome::Failure);
    }
    let order = registry.breaker("orderService");
    assert_eq!(order.state(), CircuitState::Closed);
    assert_eq!(order.config().open_cooldown(), Duration::from_secs(30));
    assert_eq!(
        registry.breaker("inventoryService").config().sliding_window_size(),
        2
    );
}

#[test]
fn snapshot_is_sorted_by_name() {
    let registry = registry();
    for name in ["paymentService", "orderService", "inventoryService"] {
        registry.breaker(name);
    }
    registry.on_outcome("paymentService", Outcome::Timeout);
    registry.on_outcome("paymentService", Outcome::Timeout);

    let snapshot = registry.snapshot();
    let names: Vec<_> = snapshot.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec!["inventoryService", "orderService", "paymentService"]
    );
    assert_eq!(snapshot[2].1.state, CircuitState::Open);
    assert_eq!(snapshot[0].1.state, CircuitState::Closed);
    assert_eq!(
        registry.names(),
        vec![
            BreakerName::from("inventoryService"),
            BreakerName::from("orderService"),
            BreakerName::from("paymentService"),
        ]
    );
}
