//! Circuit breaker for dependency protection.
//!
//! # States
//! - Closed: normal operation, calls pass through and outcomes are recorded
//! - Open: dependency assumed down, calls fail fast to the fallback
//! - Half-Open: a limited number of trial calls probe for recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: sliding window full and failure rate >= threshold
//! Open → Half-Open: first call after the open duration has elapsed
//! Half-Open → Closed: every trial call succeeded
//! Half-Open → Open: any trial call failed
//! ```
//!
//! # Design Decisions
//! - One breaker per dependency name, shared by all callers
//! - State and window sit behind a single mutex that is never held across an await
//! - Every transition bumps a generation; outcomes of calls admitted under an
//!   older generation are discarded
//! - `run` never surfaces an operation error, the fallback decides the result

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::resilience::error::ResilienceError;
use crate::resilience::timeouts::run_with_timeout;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Failure ratio (0.0-1.0] of a full window that opens the circuit.
    pub failure_rate_threshold: f64,
    /// Number of most recent outcomes considered.
    pub sliding_window_size: usize,
    /// Time spent open before trial calls are allowed.
    pub open_duration: Duration,
    /// Trial calls admitted while half-open; all must succeed to close.
    pub half_open_trial_calls: u32,
    /// Deadline for a single guarded call.
    pub call_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 0.5,
            sliding_window_size: 10,
            open_duration: Duration::from_secs(60),
            half_open_trial_calls: 3,
            call_timeout: Duration::from_secs(10),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn failure_rate_threshold(mut self, threshold: f64) -> Self {
        self.failure_rate_threshold = threshold;
        self
    }

    pub fn sliding_window_size(mut self, size: usize) -> Self {
        self.sliding_window_size = size;
        self
    }

    pub fn open_duration(mut self, duration: Duration) -> Self {
        self.open_duration = duration;
        self
    }

    pub fn half_open_trial_calls(mut self, calls: u32) -> Self {
        self.half_open_trial_calls = calls;
        self
    }

    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure,
}

/// Fixed-capacity record of the most recent call outcomes.
#[derive(Debug)]
struct SlidingWindow {
    outcomes: VecDeque<Outcome>,
    capacity: usize,
    failures: usize,
}

impl SlidingWindow {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
            failures: 0,
        }
    }

    fn record(&mut self, outcome: Outcome) {
        if self.outcomes.len() == self.capacity {
            if let Some(Outcome::Failure) = self.outcomes.pop_front() {
                self.failures -= 1;
            }
        }
        if outcome == Outcome::Failure {
            self.failures += 1;
        }
        self.outcomes.push_back(outcome);
    }

    fn is_full(&self) -> bool {
        self.outcomes.len() == self.capacity
    }

    fn failure_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.failures as f64 / self.outcomes.len() as f64
    }

    fn clear(&mut self) {
        self.outcomes.clear();
        self.failures = 0;
    }
}

#[derive(Debug)]
struct BreakerCore {
    state: CircuitState,
    window: SlidingWindow,
    opened_at: Option<Instant>,
    trials_admitted: u32,
    trial_successes: u32,
    generation: u64,
}

/// Point-in-time view of a breaker, for status endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub buffered_calls: usize,
    pub failed_calls: usize,
    pub failure_rate: f64,
}

/// Circuit breaker guarding one named dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    core: Mutex<BreakerCore>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let window = SlidingWindow::new(config.sliding_window_size);
        Self {
            name: name.into(),
            config,
            core: Mutex::new(BreakerCore {
                state: CircuitState::Closed,
                window,
                opened_at: None,
                trials_admitted: 0,
                trial_successes: 0,
                generation: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state. Does not perform the Open → Half-Open transition;
    /// that happens when the next call arrives.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let core = self.lock();
        BreakerSnapshot {
            name: self.name.clone(),
            state: core.state,
            buffered_calls: core.window.outcomes.len(),
            failed_calls: core.window.failures,
            failure_rate: core.window.failure_rate(),
        }
    }

    /// Run `operation` under the breaker, substituting `fallback` on failure.
    ///
    /// The operation runs on its own task under the configured call timeout.
    /// When the circuit is open the operation is not invoked and the fallback
    /// receives `ResilienceError::CircuitOpen`. Only an error returned by the
    /// fallback itself reaches the caller.
    pub async fn run<T, E, Er, F, Fut, FB>(&self, operation: F, fallback: FB) -> Result<T, E>
    where
        T: Send + 'static,
        Er: Into<ResilienceError> + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Er>> + Send + 'static,
        FB: FnOnce(ResilienceError) -> Result<T, E>,
    {
        let permit = match self.try_acquire() {
            Ok(permit) => permit,
            Err(rejection) => {
                tracing::debug!(breaker = %self.name, "Call rejected, invoking fallback");
                metrics::record_fallback(&self.name, "rejected");
                return fallback(rejection);
            }
        };

        let call = operation();
        let result = run_with_timeout(self.config.call_timeout, async move {
            call.await.map_err(Into::into)
        })
        .await;

        match result {
            Ok(value) => {
                permit.complete(Outcome::Success);
                Ok(value)
            }
            Err(error) => {
                permit.complete(Outcome::Failure);
                tracing::warn!(breaker = %self.name, error = %error, "Guarded call failed, invoking fallback");
                metrics::record_fallback(&self.name, "failure");
                fallback(error)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_acquire(&self) -> Result<CallPermit<'_>, ResilienceError> {
        let mut core = self.lock();

        if core.state == CircuitState::Open {
            let elapsed = core.opened_at.map(|at| at.elapsed()).unwrap_or_default();
            if elapsed >= self.config.open_duration {
                self.transition(&mut core, CircuitState::HalfOpen);
            }
        }

        match core.state {
            CircuitState::Closed => {}
            CircuitState::HalfOpen if core.trials_admitted < self.config.half_open_trial_calls => {
                core.trials_admitted += 1;
            }
            CircuitState::HalfOpen | CircuitState::Open => {
                metrics::record_call(&self.name, "rejected");
                return Err(ResilienceError::CircuitOpen {
                    name: self.name.clone(),
                });
            }
        }

        Ok(CallPermit {
            breaker: self,
            generation: core.generation,
            completed: false,
        })
    }

    fn on_outcome(&self, generation: u64, outcome: Outcome) {
        let mut core = self.lock();
        if core.generation != generation {
            tracing::debug!(breaker = %self.name, ?outcome, "Discarding outcome from a previous state");
            return;
        }

        metrics::record_call(
            &self.name,
            match outcome {
                Outcome::Success => "success",
                Outcome::Failure => "failure",
            },
        );

        match core.state {
            CircuitState::Closed => {
                core.window.record(outcome);
                let rate = core.window.failure_rate();
                if core.window.is_full() && rate >= self.config.failure_rate_threshold {
                    tracing::warn!(
                        breaker = %self.name,
                        failure_rate = rate,
                        threshold = self.config.failure_rate_threshold,
                        "Failure rate threshold reached"
                    );
                    self.transition(&mut core, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => match outcome {
                Outcome::Success => {
                    core.trial_successes += 1;
                    if core.trial_successes >= self.config.half_open_trial_calls {
                        self.transition(&mut core, CircuitState::Closed);
                    }
                }
                Outcome::Failure => self.transition(&mut core, CircuitState::Open),
            },
            // Unreachable with a matching generation; nothing is admitted while open.
            CircuitState::Open => {}
        }
    }

    /// Return an unused half-open trial slot (caller went away mid-call).
    fn release(&self, generation: u64) {
        let mut core = self.lock();
        if core.generation == generation && core.state == CircuitState::HalfOpen {
            core.trials_admitted = core.trials_admitted.saturating_sub(1);
        }
    }

    fn transition(&self, core: &mut BreakerCore, to: CircuitState) {
        let from = core.state;
        core.state = to;
        core.generation += 1;
        core.trials_admitted = 0;
        core.trial_successes = 0;

        match to {
            CircuitState::Open => core.opened_at = Some(Instant::now()),
            CircuitState::Closed => {
                core.opened_at = None;
                core.window.clear();
            }
            CircuitState::HalfOpen => {}
        }

        tracing::info!(
            breaker = %self.name,
            from = from.as_str(),
            to = to.as_str(),
            "Circuit breaker state change"
        );
        metrics::record_breaker_state(&self.name, to);
    }
}

/// Admission ticket for one guarded call.
///
/// Dropping it without `complete` hands a half-open trial slot back.
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    completed: bool,
}

impl CallPermit<'_> {
    fn complete(mut self, outcome: Outcome) {
        self.completed = true;
        self.breaker.on_outcome(self.generation, outcome);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.breaker.release(self.generation);
        }
    }
}
