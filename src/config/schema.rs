//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::policy::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRYABLE_KINDS};
use crate::resilience::{Backoff, CircuitBreakerConfig, ErrorKind, PolicyError, RetryPolicy};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The flaky dependency the resilience core calls.
    pub remote: RemoteConfig,

    /// Retry configuration.
    pub retry: RetryConfig,

    /// Circuit breaker configuration.
    pub circuit_breaker: CircuitBreakerSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Total time allowed for one inbound request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Remote dependency configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Dependency name; keys the circuit breaker and shared retry executor.
    pub name: String,

    /// Base URL of the service exposing `/sleep/{is_error}`.
    pub base_url: String,

    /// Client-side timeout for one HTTP request, in seconds.
    pub request_timeout_secs: u64,

    /// How long the in-process `/sleep/false` endpoint sleeps, in milliseconds.
    pub sleep_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            name: "test".to_string(),
            base_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 30,
            sleep_ms: 5_000,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,

    /// Error kinds worth another attempt.
    pub retryable_error_kinds: Vec<ErrorKind>,

    /// Delay strategy between attempts.
    pub backoff: BackoffStrategy,

    /// Fixed delay, or base delay for exponential backoff, in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    None,
    Fixed,
    Exponential,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retryable_error_kinds: DEFAULT_RETRYABLE_KINDS.to_vec(),
            backoff: BackoffStrategy::None,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Backoff {
        match self.backoff {
            BackoffStrategy::None => Backoff::None,
            BackoffStrategy::Fixed => Backoff::Fixed(Duration::from_millis(self.base_delay_ms)),
            BackoffStrategy::Exponential => Backoff::Exponential {
                base: Duration::from_millis(self.base_delay_ms),
                max: Duration::from_millis(self.max_delay_ms),
            },
        }
    }

    pub fn to_policy(&self) -> Result<RetryPolicy, PolicyError> {
        Ok(RetryPolicy::new(self.max_attempts)?
            .retry_on(&self.retryable_error_kinds)
            .with_backoff(self.backoff()))
    }
}

/// Circuit breaker configuration as written in config files.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Failure ratio (0.0-1.0] of a full window that opens the circuit.
    pub failure_rate_threshold: f64,

    /// Number of recent outcomes the failure rate is computed over.
    pub sliding_window_size: usize,

    /// Time spent open before trial calls, in seconds.
    pub open_duration_secs: u64,

    /// Trial calls allowed while half-open.
    pub half_open_trial_calls: u32,

    /// Deadline for one guarded call, in seconds.
    pub call_timeout_secs: u64,

    /// Body returned when the fallback fires.
    pub fallback_response: String,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        let defaults = CircuitBreakerConfig::default();
        Self {
            failure_rate_threshold: defaults.failure_rate_threshold,
            sliding_window_size: defaults.sliding_window_size,
            open_duration_secs: defaults.open_duration.as_secs(),
            half_open_trial_calls: defaults.half_open_trial_calls,
            call_timeout_secs: defaults.call_timeout.as_secs(),
            fallback_response: "fallback!".to_string(),
        }
    }
}

impl CircuitBreakerSettings {
    pub fn to_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_rate_threshold: self.failure_rate_threshold,
            sliding_window_size: self.sliding_window_size,
            open_duration: Duration::from_secs(self.open_duration_secs),
            half_open_trial_calls: self.half_open_trial_calls,
            call_timeout: Duration::from_secs(self.call_timeout_secs),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the pretty format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
