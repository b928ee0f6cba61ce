//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts >= 1, thresholds in range, timeouts > 0)
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be > 0"));
    }

    if config.remote.name.trim().is_empty() {
        errors.push(ValidationError::new("remote.name", "must not be empty"));
    }
    if let Err(e) = Url::parse(&config.remote.base_url) {
        errors.push(ValidationError::new("remote.base_url", e.to_string()));
    }
    if config.remote.request_timeout_secs == 0 {
        errors.push(ValidationError::new("remote.request_timeout_secs", "must be > 0"));
    }

    let retry = &config.retry;
    if retry.max_attempts == 0 {
        errors.push(ValidationError::new("retry.max_attempts", "must be at least 1"));
    }
    if retry.max_delay_ms < retry.base_delay_ms {
        errors.push(ValidationError::new(
            "retry.max_delay_ms",
            "must not be smaller than base_delay_ms",
        ));
    }

    let cb = &config.circuit_breaker;
    if !(cb.failure_rate_threshold > 0.0 && cb.failure_rate_threshold <= 1.0) {
        errors.push(ValidationError::new(
            "circuit_breaker.failure_rate_threshold",
            "must be in (0.0, 1.0]",
        ));
    }
    if cb.sliding_window_size == 0 {
        errors.push(ValidationError::new("circuit_breaker.sliding_window_size", "must be at least 1"));
    }
    if cb.half_open_trial_calls == 0 {
        errors.push(ValidationError::new("circuit_breaker.half_open_trial_calls", "must be at least 1"));
    }
    if cb.call_timeout_secs == 0 {
        errors.push(ValidationError::new("circuit_breaker.call_timeout_secs", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_threshold_range() {
        let mut config = AppConfig::default();
        config.circuit_breaker.failure_rate_threshold = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "circuit_breaker.failure_rate_threshold");

        config.circuit_breaker.failure_rate_threshold = 1.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_bad_url_and_address() {
        let mut config = AppConfig::default();
        config.remote.base_url = "not a url".into();
        config.listener.bind_address = "localhost".into();
        let fields: Vec<_> = validate_config(&config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["listener.bind_address", "remote.base_url"]);
    }
}
