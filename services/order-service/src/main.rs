//! Order service.
//!
//! The downstream dependency of the user service. It answers
//! `GET /orders` and `GET /order` with a fixed greeting.

use anyhow::Context;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const GREETING: &str = "Hello from order-service!";

#[derive(Debug, Parser)]
#[command(name = "order-service", about = "Downstream order service")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8081", env = "ORDER_SERVICE_LISTEN")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;

    tracing::info!("order-service listening on http://{}", args.listen);
    tracing::info!("  curl http://{}/orders", args.listen);

    axum::serve(listener, app()).await.context("server error")?;
    Ok(())
}

fn app() -> Router {
    Router::new()
        .route("/orders", get(orders))
        .route("/order", get(orders))
        .route("/health", get(health))
}

async fn orders() -> &'static str {
    GREETING
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "UP" })))
}
