//! Service configuration and logical service names.

use callguard::GatewayConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Logical name of the downstream order service.
pub const ORDER_SERVICE: &str = "order-service";

/// Breaker name guarding calls to the order service.
pub const ORDER_BREAKER: &str = "orderService";

/// Contents of the `--config` file.
///
/// ```toml
/// listen = "127.0.0.1:8080"
/// orderPath = "/order"
///
/// [services]
/// order-service = "http://127.0.0.1:8081"
///
/// [gateway]
/// failureRateThreshold = 50
/// openCooldown = "10s"
/// callTimeout = "1s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceConfig {
    pub listen: SocketAddr,
    /// Path requested on the order service.
    pub order_path: String,
    /// Base URL per logical service name.
    pub services: BTreeMap<String, String>,
    pub gateway: GatewayConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let mut services = BTreeMap::new();
        services.insert(
            ORDER_SERVICE.to_string(),
            "http://127.0.0.1:8081".to_string(),
        );
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            order_path: "/order".to_string(),
            services,
            gateway: GatewayConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Reads a TOML file; the gateway section is validated.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ServiceConfig = toml::from_str(&content)?;
        config.gateway.validate()?;
        Ok(config)
    }
}

/// A logical service name has no configured base URL.
#[derive(Debug, Clone, Error)]
#[error("no address configured for service '{0}'")]
pub struct UnknownService(String);

/// Static map from logical service name to base URL.
#[derive(Debug, Clone, Default)]
pub struct ServiceResolver {
    services: BTreeMap<String, String>,
}

impl ServiceResolver {
    pub fn new(services: BTreeMap<String, String>) -> Self {
        Self { services }
    }

    /// Builds the absolute URL for `path` on `service`.
    pub fn url(&self, service: &str, path: &str) -> Result<String, UnknownService> {
        let base = self
            .services
            .get(service)
            .ok_or_else(|| UnknownService(service.to_string()))?;
        Ok(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }
}
