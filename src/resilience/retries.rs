//! Retry execution.
//!
//! # Responsibilities
//! - Invoke an operation until it succeeds or the policy gives up
//! - Sleep between attempts according to the policy's backoff
//! - Report exhaustion vs. non-retryable failure distinctly
//!
//! # Design Decisions
//! - The executor owns its policy behind an `Arc`, so one executor can be
//!   configured once and shared across calls
//! - Per-call state lives in a fresh `RetryContext` and never escapes `execute`

use std::future::Future;
use std::sync::Arc;

use crate::observability::metrics;
use crate::resilience::error::{CallError, ResilienceError};
use crate::resilience::policy::{RetryContext, RetryPolicy};

/// Drives repeated attempts of an operation under a `RetryPolicy`.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    name: Arc<str>,
    policy: Arc<RetryPolicy>,
}

impl RetryExecutor {
    pub fn new(name: impl Into<Arc<str>>, policy: RetryPolicy) -> Self {
        Self {
            name: name.into(),
            policy: Arc::new(policy),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation`, retrying failed attempts the policy allows.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, ResilienceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CallError>>,
    {
        let mut context = RetryContext::new();

        loop {
            let attempt = context.attempt_number();
            metrics::record_attempt(&self.name, attempt);

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(name = %self.name, attempt, "Call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !self.policy.should_retry(&context, &error) {
                return Err(self.give_up(attempt, error));
            }

            let delay = self.policy.backoff().delay_for(attempt);
            tracing::warn!(
                name = %self.name,
                attempt,
                max_attempts = self.policy.max_attempts(),
                delay = ?delay,
                error = %error,
                "Attempt failed, retrying"
            );
            context.record_failure(error);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            context.advance();
        }
    }

    fn give_up(&self, attempt: u32, error: CallError) -> ResilienceError {
        if self.policy.is_retryable(&error) {
            tracing::error!(name = %self.name, attempts = attempt, error = %error, "Retries exhausted");
            metrics::record_retries_exhausted(&self.name);
            ResilienceError::RetryExhausted {
                attempts: attempt,
                last: error,
            }
        } else {
            tracing::warn!(name = %self.name, attempt, error = %error, "Non-retryable failure");
            ResilienceError::NonRetryable {
                attempt,
                source: error,
            }
        }
    }
}
