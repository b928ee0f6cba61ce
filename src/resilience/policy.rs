//! Retry decisions.
//!
//! # Responsibilities
//! - Hold the attempt budget and retryable-error predicate
//! - Decide, per failed attempt, whether another attempt is allowed
//! - Carry the delay strategy the executor applies between attempts
//!
//! # Design Decisions
//! - The policy is immutable and freely shared; per-call state lives in
//!   `RetryContext`
//! - Non-retryable errors fail fast regardless of remaining budget

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::resilience::backoff::Backoff;
use crate::resilience::error::{CallError, ErrorKind};

/// Default attempt budget (first call plus two retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Error kinds retried when no explicit list is given.
pub const DEFAULT_RETRYABLE_KINDS: [ErrorKind; 2] = [ErrorKind::Transient, ErrorKind::Timeout];

type Predicate = Arc<dyn Fn(&CallError) -> bool + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
}

/// Mutable state of one `execute` invocation.
#[derive(Debug, Clone)]
pub struct RetryContext {
    attempt_number: u32,
    last_error: Option<CallError>,
}

impl RetryContext {
    pub(crate) fn new() -> Self {
        Self {
            attempt_number: 1,
            last_error: None,
        }
    }

    /// Current attempt, starting at 1.
    pub fn attempt_number(&self) -> u32 {
        self.attempt_number
    }

    pub fn last_error(&self) -> Option<&CallError> {
        self.last_error.as_ref()
    }

    pub(crate) fn record_failure(&mut self, error: CallError) {
        self.last_error = Some(error);
    }

    pub(crate) fn advance(&mut self) {
        self.attempt_number += 1;
    }
}

/// Immutable retry policy.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
    retryable: Predicate,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("retryable", &"<predicate>")
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::None,
            retryable: kinds_predicate(&DEFAULT_RETRYABLE_KINDS),
        }
    }
}

impl RetryPolicy {
    /// Policy with the given attempt budget and the default predicate.
    pub fn new(max_attempts: u32) -> Result<Self, PolicyError> {
        if max_attempts == 0 {
            return Err(PolicyError::ZeroAttempts);
        }
        Ok(Self {
            max_attempts,
            ..Self::default()
        })
    }

    /// Retry only errors of the listed kinds.
    pub fn retry_on(mut self, kinds: &[ErrorKind]) -> Self {
        self.retryable = kinds_predicate(kinds);
        self
    }

    /// Retry errors accepted by a custom predicate.
    pub fn retry_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&CallError) -> bool + Send + Sync + 'static,
    {
        self.retryable = Arc::new(predicate);
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    pub fn is_retryable(&self, error: &CallError) -> bool {
        (self.retryable)(error)
    }

    /// Whether another attempt should follow the failure in `context`.
    pub fn should_retry(&self, context: &RetryContext, error: &CallError) -> bool {
        context.attempt_number < self.max_attempts && self.is_retryable(error)
    }
}

fn kinds_predicate(kinds: &[ErrorKind]) -> Predicate {
    let kinds = kinds.to_vec();
    Arc::new(move |error: &CallError| kinds.contains(&error.kind()))
}
