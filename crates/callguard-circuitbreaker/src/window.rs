use callguard_core::Outcome;
use std::collections::VecDeque;

/// Fixed-capacity history of the most recent call outcomes.
///
/// Ring-buffer semantics: once `capacity` outcomes are held, recording a new
/// one evicts the oldest. The failure count is maintained incrementally so the
/// failure rate is available without rescanning the window.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    outcomes: VecDeque<Outcome>,
    capacity: usize,
    failures: usize,
}

impl SlidingWindow {
    /// Creates an empty window holding at most `capacity` outcomes.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
            failures: 0,
        }
    }

    /// Appends an outcome, returning the evicted one if the window was full.
    pub fn record(&mut self, outcome: Outcome) -> Option<Outcome> {
        let evicted = if self.outcomes.len() == self.capacity {
            self.outcomes.pop_front()
        } else {
            None
        };
        if let Some(old) = evicted {
            if old.is_failure() {
                self.failures -= 1;
            }
        }

        if outcome.is_failure() {
            self.failures += 1;
        }
        self.outcomes.push_back(outcome);
        evicted
    }

    /// Number of outcomes currently held.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns true if no outcome has been recorded since the last clear.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Maximum number of outcomes held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of `Failure` and `Timeout` outcomes in the window.
    pub fn failure_count(&self) -> usize {
        self.failures
    }

    /// Number of `Success` outcomes in the window.
    pub fn success_count(&self) -> usize {
        self.outcomes.len() - self.failures
    }

    /// Failures divided by window length, `0.0` for an empty window.
    pub fn failure_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            0.0
        } else {
            self.failures as f64 / self.outcomes.len() as f64
        }
    }

    /// Drops every recorded outcome.
    pub fn clear(&mut self) {
        self.outcomes.clear();
        self.failures = 0;
    }

    /// Iterates from the oldest to the newest outcome.
    pub fn iter(&self) -> impl Iterator<Item = Outcome> + '_ {
        self.outcomes.iter().copied()
    }
}
