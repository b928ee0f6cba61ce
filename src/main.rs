//! Resilience demo service.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────────┐
//!                        │                 RESILIENCE DEMO                    │
//!                        │                                                    │
//!   GET /retry ...       │  ┌─────────┐    ┌────────────────┐                 │
//!   ─────────────────────┼─▶│  http   │───▶│ ResilientClient │                 │
//!                        │  │ server  │    └───────┬────────┘                 │
//!                        │  └─────────┘            │                          │
//!                        │              ┌──────────┴──────────┐               │
//!                        │              ▼                     ▼               │
//!                        │     ┌─────────────────┐   ┌────────────────┐       │
//!                        │     │ circuit breaker │──▶│ retry executor │       │
//!                        │     │ (+ call timeout)│   │ (+ policy)     │       │
//!                        │     └────────┬────────┘   └───────┬────────┘       │
//!                        │              └──────────┬─────────┘                │
//!                        │                         ▼                          │
//!                        │                ┌─────────────────┐                 │
//!                        │                │  remote call    │─────────────────┼──▶ GET /sleep/{bool}
//!                        │                └─────────────────┘                 │
//!                        └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use resilience_demo::config::{load_config, override_bind_address, AppConfig};
use resilience_demo::lifecycle::{signals, startup, Shutdown};
use resilience_demo::observability::logging;

#[derive(Parser)]
#[command(name = "resilience-demo")]
#[command(about = "Retry and circuit breaker demo around a flaky HTTP endpoint", long_about = None)]
struct Args {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = args.bind {
        config = override_bind_address(config, bind)?;
    }

    logging::init_logging(&config.observability);

    tracing::info!("resilience-demo v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        remote = %config.remote.base_url,
        max_attempts = config.retry.max_attempts,
        call_timeout_secs = config.circuit_breaker.call_timeout_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_listener(shutdown.clone());

    let server = startup::build_server(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
