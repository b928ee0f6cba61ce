//! Error taxonomy for remote calls and the resilience core.
//!
//! # Design Decisions
//! - `CallError` describes a single attempt; `ResilienceError` describes what
//!   the retry executor or circuit breaker concluded from one or more attempts
//! - Classification (`ErrorKind`) is what retry predicates match on

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Failure expected to clear up on its own (5xx, connection reset).
    Transient,
    /// Failure that will not change on retry (bad request, not found).
    Permanent,
    /// Attempt exceeded its deadline.
    Timeout,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Transient => "transient",
            ErrorKind::Permanent => "permanent",
            ErrorKind::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// Failure of one attempt at a remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("transient failure: {0}")]
    Transient(String),

    #[error("permanent failure: {0}")]
    Permanent(String),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),
}

impl CallError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CallError::Transient(_) => ErrorKind::Transient,
            CallError::Permanent(_) => ErrorKind::Permanent,
            CallError::Timeout(_) => ErrorKind::Timeout,
        }
    }
}

/// Terminal outcome of a guarded call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResilienceError {
    /// Every allowed attempt failed with a retryable error.
    #[error("retries exhausted after {attempts} attempt(s): {last}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: CallError,
    },

    /// The policy refused to retry this kind of error.
    #[error("non-retryable failure on attempt {attempt}: {source}")]
    NonRetryable {
        attempt: u32,
        #[source]
        source: CallError,
    },

    /// The breaker rejected the call without running it.
    #[error("circuit breaker '{name}' is open")]
    CircuitOpen { name: String },

    /// A single unretried attempt failed.
    #[error(transparent)]
    Call(#[from] CallError),

    /// The operation task panicked or was cancelled.
    #[error("operation aborted: {0}")]
    Aborted(String),
}

impl ResilienceError {
    /// The attempt-level error behind this outcome, if there is one.
    pub fn call_error(&self) -> Option<&CallError> {
        match self {
            ResilienceError::RetryExhausted { last, .. } => Some(last),
            ResilienceError::NonRetryable { source, .. } => Some(source),
            ResilienceError::Call(err) => Some(err),
            ResilienceError::CircuitOpen { .. } | ResilienceError::Aborted(_) => None,
        }
    }

    /// True when the underlying failure was a deadline overrun.
    pub fn is_timeout(&self) -> bool {
        matches!(self.call_error(), Some(CallError::Timeout(_)))
    }
}
