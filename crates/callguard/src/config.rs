//! File-based gateway configuration.
//!
//! ```toml
//! failureRateThreshold = 50
//! minimumSampleSize = 5
//! slidingWindowSize = 10
//! openCooldown = "10s"
//! maxTrialCalls = 1
//! callTimeout = "1s"
//! cancelOnTimeout = true
//!
//! [breakers.orderService]
//! openCooldown = "30s"
//! ```
//!
//! Keys left out take their defaults. A `[breakers.<name>]` table overrides
//! individual settings for one dependency and inherits the rest.

use callguard_circuitbreaker::{CircuitBreakerConfig, ConfigError as BreakerConfigError};
use callguard_executor::ExecutorConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating a [`GatewayConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failureRateThreshold for '{name}' must be in (0, 100], got {percent}")]
    FailureRateThreshold { name: String, percent: f64 },

    #[error("invalid settings for '{name}': {source}")]
    Breaker {
        name: String,
        #[source]
        source: BreakerConfigError,
    },

    #[error("callTimeout must be greater than zero")]
    ZeroTimeout,
}

/// Settings shared by every dependency, plus per-dependency overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    /// Failure percentage (0 exclusive to 100 inclusive) that opens a circuit.
    pub failure_rate_threshold: f64,
    pub minimum_sample_size: usize,
    pub sliding_window_size: usize,
    #[serde(with = "duration")]
    pub open_cooldown: Duration,
    pub max_trial_calls: usize,
    #[serde(with = "duration")]
    pub call_timeout: Duration,
    pub cancel_on_timeout: bool,
    /// Overrides keyed by dependency name.
    pub breakers: BTreeMap<String, BreakerOverrides>,
}

/// Per-dependency overrides; unset fields inherit from [`GatewayConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BreakerOverrides {
    pub failure_rate_threshold: Option<f64>,
    pub minimum_sample_size: Option<usize>,
    pub sliding_window_size: Option<usize>,
    #[serde(with = "option_duration", skip_serializing_if = "Option::is_none")]
    pub open_cooldown: Option<Duration>,
    pub max_trial_calls: Option<usize>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            minimum_sample_size: 5,
            sliding_window_size: 10,
            open_cooldown: Duration::from_secs(10),
            max_trial_calls: 1,
            call_timeout: Duration::from_secs(1),
            cancel_on_timeout: true,
            breakers: BTreeMap::new(),
        }
    }
}

impl GatewayConfig {
    /// Reads and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GatewayConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the defaults and every override.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.call_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        self.default_breaker_config()?;
        for name in self.breakers.keys() {
            self.breaker_config(name)?;
        }
        Ok(())
    }

    /// Breaker configuration for dependencies without overrides.
    pub fn default_breaker_config(&self) -> Result<CircuitBreakerConfig, ConfigError> {
        self.build_breaker_config("default", &BreakerOverrides::default())
    }

    /// Breaker configuration for `name`, with its overrides applied.
    pub fn breaker_config(&self, name: &str) -> Result<CircuitBreakerConfig, ConfigError> {
        match self.breakers.get(name) {
            Some(overrides) => self.build_breaker_config(name, overrides),
            None => self.default_breaker_config(),
        }
    }

    /// Executor configuration.
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig::builder()
            .timeout(self.call_timeout)
            .cancel_on_timeout(self.cancel_on_timeout)
            .build()
    }

    fn build_breaker_config(
        &self,
        name: &str,
        overrides: &BreakerOverrides,
    ) -> Result<CircuitBreakerConfig, ConfigError> {
        let percent = overrides
            .failure_rate_threshold
            .unwrap_or(self.failure_rate_threshold);
        if !(percent > 0.0 && percent <= 100.0) {
            return Err(ConfigError::FailureRateThreshold {
                name: name.to_string(),
                percent,
            });
        }

        CircuitBreakerConfig::builder()
            .failure_rate_threshold(percent / 100.0)
            .minimum_sample_size(
                overrides
                    .minimum_sample_size
                    .unwrap_or(self.minimum_sample_size),
            )
            .sliding_window_size(
                overrides
                    .sliding_window_size
                    .unwrap_or(self.sliding_window_size),
            )
            .open_cooldown(overrides.open_cooldown.unwrap_or(self.open_cooldown))
            .max_trial_calls(overrides.max_trial_calls.unwrap_or(self.max_trial_calls))
            .build()
            .map_err(|source| ConfigError::Breaker {
                name: name.to_string(),
                source,
            })
    }
}

/// Human-readable durations such as `"10s"` or `"1500ms"`.
mod duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

mod option_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.collect_str(&humantime::format_duration(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|text| humantime::parse_duration(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}
