use crate::{CircuitBreaker, CircuitBreakerConfig, CircuitMetrics, Permit, Rejected};
use callguard_core::{BreakerName, Outcome};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// Owns one [`CircuitBreaker`] per dependency name.
///
/// Breakers are created lazily from the default configuration the first time
/// a name is seen, unless a specific configuration was registered for it.
/// Lookups are sharded; there is no lock shared by all names.
pub struct BreakerRegistry {
    default_config: Arc<CircuitBreakerConfig>,
    breakers: DashMap<BreakerName, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    /// Creates an empty registry whose lazily created breakers use `default_config`.
    pub fn new(default_config: impl Into<Arc<CircuitBreakerConfig>>) -> Self {
        Self {
            default_config: default_config.into(),
            breakers: DashMap::new(),
        }
    }

    /// Configuration used for names without a registered override.
    pub fn default_config(&self) -> &CircuitBreakerConfig {
        &self.default_config
    }

    /// Installs a breaker with its own configuration.
    ///
    /// Replaces any existing breaker of that name, discarding its state.
    pub fn register(
        &self,
        name: impl Into<BreakerName>,
        config: impl Into<Arc<CircuitBreakerConfig>>,
    ) -> Arc<CircuitBreaker> {
        let name = name.into();
        let breaker = Arc::new(CircuitBreaker::new(name.clone(), config));
        self.breakers.insert(name, Arc::clone(&breaker));
        breaker
    }

    /// Returns the breaker for `name`, creating it on first use.
    pub fn breaker(&self, name: &str) -> Arc<CircuitBreaker> {
        // The read guard must be gone before entry() locks the shard for writing.
        if let Some(existing) = self.get(name) {
            return existing;
        }

        let name = BreakerName::from(name);
        Arc::clone(
            self.breakers
                .entry(name.clone())
                .or_insert_with(|| {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(breaker = %name, "creating circuit breaker");

                    Arc::new(CircuitBreaker::new(
                        name,
                        Arc::clone(&self.default_config),
                    ))
                })
                .value(),
        )
    }

    /// Returns the breaker for `name` if it already exists.
    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Asks the breaker for `name` whether a call may proceed.
    pub fn allow(&self, name: &str) -> Result<Permit, Rejected> {
        self.breaker(name).allow()
    }

    /// Reports an outcome for `name` without a permit.
    pub fn on_outcome(&self, name: &str, outcome: Outcome) {
        self.breaker(name).on_outcome(outcome);
    }

    /// Names of every known breaker, sorted.
    pub fn names(&self) -> Vec<BreakerName> {
        let mut names: Vec<_> = self.breakers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Metrics of every known breaker, sorted by name.
    pub fn snapshot(&self) -> Vec<(BreakerName, CircuitMetrics)> {
        let breakers: Vec<_> = self
            .breakers
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();

        // Shard guards are released above; metrics() takes each breaker's lock.
        let mut snapshot: Vec<_> = breakers
            .into_iter()
            .map(|(name, breaker)| (name, breaker.metrics()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }

    /// Returns true if any known breaker is open.
    pub fn any_open(&self) -> bool {
        self.breakers.iter().any(|e| e.value().is_open())
    }

    /// Number of known breakers.
    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    /// Returns true if no breaker has been created yet.
    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl fmt::Debug for BreakerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreakerRegistry")
            .field("breakers", &self.names())
            .finish()
    }
}
