//! Resilience patterns around a flaky HTTP dependency.
//!
//! Timed retry, circuit breaking, and retry inside a circuit breaker, exposed
//! as a small library (`resilience`, `client`) plus the demo service that
//! drives it over HTTP.

pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod remote;
pub mod resilience;

pub use client::ResilientClient;
pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
