//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Guarded call:
//!     → circuit_breaker.rs (admit or short-circuit to fallback)
//!     → timeouts.rs (run on own task, enforce call deadline)
//!     → retries.rs (re-invoke per policy.rs, sleeping per backoff.rs)
//!     → remote call
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every breaker-guarded call has a deadline
//! - Retries only for error kinds the policy accepts
//! - Circuit breaker prevents cascading failures
//! - Breakers are shared per dependency through registry.rs

pub mod backoff;
pub mod circuit_breaker;
pub mod error;
pub mod policy;
pub mod registry;
pub mod retries;
pub mod timeouts;

pub use backoff::Backoff;
pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use error::{CallError, ErrorKind, ResilienceError};
pub use policy::{PolicyError, RetryContext, RetryPolicy};
pub use registry::{create_breaker, BreakerRegistry};
pub use retries::RetryExecutor;
