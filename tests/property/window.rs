//! Property tests for the sliding window.
//!
//! Invariants tested:
//! - Never holds more than its capacity
//! - Holds exactly the most recent outcomes, oldest first
//! - Failure and success counts add up to the length

use super::outcome;
use callguard_circuitbreaker::SlidingWindow;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn window_keeps_most_recent_outcomes(
        capacity in 1usize..=32,
        outcomes in prop::collection::vec(outcome(), 0..200),
    ) {
        let mut window = SlidingWindow::new(capacity);
        for (i, outcome) in outcomes.iter().enumerate() {
            let evicted = window.record(*outcome);
            prop_assert_eq!(evicted.is_some(), i >= capacity);
            prop_assert!(window.len() <= capacity);
        }

        let start = outcomes.len().saturating_sub(capacity);
        let expected = &outcomes[start..];
        let held: Vec<_> = window.iter().collect();
        prop_assert_eq!(held.as_slice(), expected);

        let failures = expected.iter().filter(|o| o.is_failure()).count();
        prop_assert_eq!(window.failure_count(), failures);
        prop_assert_eq!(window.failure_count() + window.success_count(), window.len());

        if !expected.is_empty() {
            let rate = failures as f64 / expected.len() as f64;
            prop_assert!((window.failure_rate() - rate).abs() < 1e-12);
        }
    }
}
