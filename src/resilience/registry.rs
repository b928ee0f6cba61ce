//! Process-wide circuit breaker registry.
//!
//! # Responsibilities
//! - Create breakers on first use, keyed by dependency name
//! - Hand every caller targeting a dependency the same shared breaker
//!
//! # Design Decisions
//! - Entries live for the life of the process; there is no removal

use std::sync::Arc;

use dashmap::DashMap;

use crate::resilience::circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig};

/// Build a standalone breaker for `name`.
pub fn create_breaker(name: &str, config: CircuitBreakerConfig) -> CircuitBreaker {
    tracing::debug!(breaker = %name, ?config, "Creating circuit breaker");
    CircuitBreaker::new(name, config)
}

/// Shared breakers keyed by dependency name.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    default_config: CircuitBreakerConfig,
}

impl BreakerRegistry {
    pub fn new(default_config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: DashMap::new(),
            default_config,
        }
    }

    /// Breaker for `name`, creating it on first use.
    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return existing.clone();
        }

        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(create_breaker(name, self.default_config.clone())))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|entry| entry.clone())
    }

    /// Snapshots of every registered breaker, sorted by name.
    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        let mut snapshots: Vec<_> = self
            .breakers
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
