//! Metrics collection and exposition.
//!
//! # Metrics
//! - `resilience_attempts_total` (counter): attempts by executor, first vs retry
//! - `resilience_retries_exhausted_total` (counter): calls that ran out of attempts
//! - `circuit_breaker_calls_total` (counter): breaker outcomes by name and result
//! - `circuit_breaker_fallbacks_total` (counter): fallbacks by name and trigger
//! - `circuit_breaker_state` (gauge): 0=closed, 1=half_open, 2=open
//! - `http_requests_total` (counter): inbound requests by endpoint and status
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exposition is optional and runs on its own listener

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::CircuitState;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_attempt(executor: &str, attempt: u32) {
    let kind = if attempt == 1 { "first" } else { "retry" };
    metrics::counter!(
        "resilience_attempts_total",
        "executor" => executor.to_string(),
        "kind" => kind
    )
    .increment(1);
}

pub fn record_retries_exhausted(executor: &str) {
    metrics::counter!(
        "resilience_retries_exhausted_total",
        "executor" => executor.to_string()
    )
    .increment(1);
}

pub fn record_call(breaker: &str, result: &'static str) {
    metrics::counter!(
        "circuit_breaker_calls_total",
        "breaker" => breaker.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_fallback(breaker: &str, trigger: &'static str) {
    metrics::counter!(
        "circuit_breaker_fallbacks_total",
        "breaker" => breaker.to_string(),
        "trigger" => trigger
    )
    .increment(1);
}

pub fn record_breaker_state(breaker: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    metrics::gauge!("circuit_breaker_state", "breaker" => breaker.to_string()).set(value);
}

pub fn record_request(endpoint: &'static str, status: u16) {
    metrics::counter!(
        "http_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
}
