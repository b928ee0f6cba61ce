//! Resilient client façade.
//!
//! # Responsibilities
//! - Compose retry and circuit breaking around the flaky endpoint
//! - Expose one method per call mode served by the HTTP layer
//!
//! # Call Modes
//! ```text
//! retry only:        executor(per call) → endpoint
//! shared retry:      executor(per dependency, reused) → endpoint
//! breaker only:      breaker → endpoint | fallback
//! breaker + retry:   breaker → executor(shared) → endpoint | fallback
//! ```
//!
//! # Design Decisions
//! - In the combined mode retries run inside one breaker-guarded unit, so the
//!   breaker records a single outcome per client call
//! - The breaker's call timeout covers the whole retry sequence

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::AppConfig;
use crate::remote::FlakyEndpoint;
use crate::resilience::{
    BreakerRegistry, CircuitBreaker, PolicyError, ResilienceError, RetryExecutor, RetryPolicy,
};

/// Produces the substitute result when the breaker path fails.
pub type Fallback = Arc<dyn Fn(ResilienceError) -> Result<String, ResilienceError> + Send + Sync>;

/// Fallback answering with a fixed body.
pub fn static_fallback(body: impl Into<String>) -> Fallback {
    let body = body.into();
    Arc::new(move |error: ResilienceError| -> Result<String, ResilienceError> {
        tracing::info!(error = %error, "Serving fallback response");
        Ok(body.clone())
    })
}

/// Entry point for calls to one named dependency.
pub struct ResilientClient {
    dependency: String,
    endpoint: FlakyEndpoint,
    default_policy: RetryPolicy,
    shared_executors: DashMap<String, RetryExecutor>,
    breakers: Arc<BreakerRegistry>,
    fallback: Fallback,
}

impl ResilientClient {
    pub fn new(
        dependency: impl Into<String>,
        endpoint: FlakyEndpoint,
        default_policy: RetryPolicy,
        breakers: Arc<BreakerRegistry>,
    ) -> Self {
        Self {
            dependency: dependency.into(),
            endpoint,
            default_policy,
            shared_executors: DashMap::new(),
            breakers,
            fallback: static_fallback("fallback!"),
        }
    }

    /// Build a client from validated configuration.
    pub fn from_config(config: &AppConfig, endpoint: FlakyEndpoint) -> Result<Self, PolicyError> {
        let policy = config.retry.to_policy()?;
        let breakers = Arc::new(BreakerRegistry::new(
            config.circuit_breaker.to_breaker_config(),
        ));
        Ok(Self::new(config.remote.name.clone(), endpoint, policy, breakers)
            .with_fallback(static_fallback(config.circuit_breaker.fallback_response.clone())))
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn breakers(&self) -> &Arc<BreakerRegistry> {
        &self.breakers
    }

    /// The breaker guarding this client's dependency.
    pub fn breaker(&self) -> Arc<CircuitBreaker> {
        self.breakers.get_or_create(&self.dependency)
    }

    /// Retry executor configured once for the dependency and reused by every call.
    pub fn shared_executor(&self) -> RetryExecutor {
        self.shared_executors
            .entry(self.dependency.clone())
            .or_insert_with(|| {
                tracing::info!(dependency = %self.dependency, "Configuring shared retry executor");
                RetryExecutor::new(self.dependency.as_str(), self.default_policy.clone())
            })
            .clone()
    }

    /// Retry with an executor built for this call; errors reach the caller.
    pub async fn call_with_retry_only(&self) -> Result<String, ResilienceError> {
        let executor = RetryExecutor::new(self.dependency.as_str(), self.default_policy.clone());
        let endpoint = &self.endpoint;
        executor.execute(move || endpoint.invoke()).await
    }

    /// Retry through the dependency's shared executor; errors reach the caller.
    pub async fn call_with_shared_retry_policy(&self) -> Result<String, ResilienceError> {
        let executor = self.shared_executor();
        let endpoint = &self.endpoint;
        executor.execute(move || endpoint.invoke()).await
    }

    /// Single guarded attempt; failures and rejections become the fallback.
    pub async fn call_with_circuit_breaker_only(&self) -> Result<String, ResilienceError> {
        let endpoint = self.endpoint.clone();
        let fallback = self.fallback.clone();
        self.breaker()
            .run(
                move || async move { endpoint.invoke().await },
                move |error| fallback(error),
            )
            .await
    }

    /// Retries inside one breaker-guarded unit; the final retry result is the
    /// breaker outcome.
    pub async fn call_with_circuit_breaker_and_retry(&self) -> Result<String, ResilienceError> {
        let executor = self.shared_executor();
        let endpoint = self.endpoint.clone();
        let fallback = self.fallback.clone();
        self.breaker()
            .run(
                move || async move { executor.execute(|| endpoint.invoke()).await },
                move |error| fallback(error),
            )
            .await
    }
}

impl std::fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientClient")
            .field("dependency", &self.dependency)
            .field("default_policy", &self.default_policy)
            .finish_non_exhaustive()
    }
}
