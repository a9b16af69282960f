//! User service.
//!
//! Serves `/user/order` by calling the order service through a callguard
//! gateway: while the order service is failing, slow, or its circuit is
//! open, callers get a fallback text instead of an error.
//!
//! ```text
//! curl http://127.0.0.1:8080/user/order
//! curl http://127.0.0.1:8080/health
//! ```

use anyhow::Context;
use callguard::Gateway;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod routes;

use config::{ServiceConfig, ServiceResolver, ORDER_SERVICE};
use routes::AppState;

#[derive(Debug, Parser)]
#[command(name = "user-service", about = "User service with guarded order lookups")]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "USER_SERVICE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides the config file)
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Base URL of the order service (overrides the config file)
    #[arg(long, env = "ORDER_SERVICE_URL")]
    order_service_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,callguard=debug".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ServiceConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(url) = args.order_service_url {
        config.services.insert(ORDER_SERVICE.to_string(), url);
    }

    let gateway = Gateway::from_config(&config.gateway).context("invalid gateway settings")?;
    let state = AppState::new(
        gateway,
        reqwest::Client::new(),
        ServiceResolver::new(config.services.clone()),
        &config.order_path,
    );

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;

    tracing::info!("user-service listening on http://{}", config.listen);
    for (name, url) in &config.services {
        tracing::info!("  {name} -> {url}");
    }

    axum::serve(listener, routes::app(state))
        .await
        .context("server error")?;
    Ok(())
}
