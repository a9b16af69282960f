//! Metrics emitted by one guarded call through the gateway.

use super::helpers::*;
use callguard::{Fallback, Gateway};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn one_failed_call_touches_every_component() {
    init_recorder();

    let gateway = Gateway::default();
    let labels_cb = [("circuitbreaker", "metrics_gateway"), ("outcome", "failure")];
    let labels_exec = [("breaker", "metrics_gateway"), ("result", "error")];
    let labels_fb = [("breaker", "metrics_gateway"), ("result", "applied")];

    let result = gateway
        .invoke(
            "metrics_gateway",
            || async { Err::<String, _>(std::io::Error::other("refused")) },
            &Fallback::value(String::new()),
        )
        .await
        .unwrap();
    assert!(result.is_fallback());

    assert_eq!(counter_value("circuitbreaker_calls_total", &labels_cb), 1);
    assert_eq!(counter_value("executor_calls_total", &labels_exec), 1);
    assert_eq!(counter_value("fallback_calls_total", &labels_fb), 1);
}
