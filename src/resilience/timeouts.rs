//! Timeout enforcement.
//!
//! # Responsibilities
//! - Run a guarded operation on its own task
//! - Stop waiting once the deadline passes and abort the task
//! - Abort the task as well when the caller stops waiting first
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - A result arriving after the deadline is dropped with the aborted task

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::resilience::error::{CallError, ResilienceError};

/// Spawned operation that is aborted when this handle goes away.
struct GuardedTask<T>(JoinHandle<T>);

impl<T> Drop for GuardedTask<T> {
    fn drop(&mut self) {
        // No-op once the task has finished.
        self.0.abort();
    }
}

/// Run `future` on a spawned task, failing with `CallError::Timeout` if it
/// does not finish within `limit`. Dropping the returned future aborts the task.
pub async fn run_with_timeout<T, Fut>(limit: Duration, future: Fut) -> Result<T, ResilienceError>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T, ResilienceError>> + Send + 'static,
{
    let mut task = GuardedTask(tokio::spawn(future));

    match tokio::time::timeout(limit, &mut task.0).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(ResilienceError::Aborted(join_error.to_string())),
        Err(_) => {
            tracing::debug!(timeout = ?limit, "Operation exceeded deadline, task aborted");
            Err(CallError::Timeout(limit).into())
        }
    }
}
