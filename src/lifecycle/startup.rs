//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn validated configuration into a wired client and server
//! - Start optional background pieces (metrics exporter)
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The breaker registry is created here, once per process

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::client::ResilientClient;
use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::observability::metrics;
use crate::remote::{FlakyEndpoint, HttpRemoteCall, RandomDecision, RemoteSetupError};
use crate::resilience::PolicyError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("remote client: {0}")]
    Remote(#[from] RemoteSetupError),

    #[error("retry policy: {0}")]
    Policy(#[from] PolicyError),
}

/// Client for the configured dependency, flipping a coin per call.
pub fn build_client(config: &AppConfig) -> Result<ResilientClient, StartupError> {
    let remote = HttpRemoteCall::new(
        &config.remote.base_url,
        Duration::from_secs(config.remote.request_timeout_secs),
    )?;
    let endpoint = FlakyEndpoint::new(Arc::new(remote), Arc::new(RandomDecision));
    Ok(ResilientClient::from_config(config, endpoint)?)
}

/// Server wired to a client built from `config`.
pub fn build_server(config: AppConfig) -> Result<HttpServer, StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to install metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = build_client(&config)?;
    Ok(HttpServer::new(config, Arc::new(client)))
}
