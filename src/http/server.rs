//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request timeout, request ID)
//! - Dispatch each entry point to one `ResilientClient` call mode
//! - Host the simulated flaky endpoint
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::client::ResilientClient;
use crate::config::AppConfig;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::AppError;
use crate::observability::metrics;
use crate::resilience::{BreakerSnapshot, ResilienceError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<ResilientClient>,
    pub sleep_duration: Duration,
}

/// HTTP server exposing the resilience demo endpoints.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    pub fn new(config: AppConfig, client: Arc<ResilientClient>) -> Self {
        let state = AppState {
            client,
            sleep_duration: Duration::from_millis(config.remote.sleep_ms),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .route("/retry", get(retry_handler))
            .route("/retry-for-service", get(retry_for_service_handler))
            .route("/retry-for-service2", get(retry_for_service2_handler))
            .route("/circuit-breaker", get(circuit_breaker_handler))
            .route("/circuit-breaker-and-retry", get(circuit_breaker_and_retry_handler))
            .route("/sleep/{is_error}", get(sleep_handler))
            .route("/breakers", get(breakers_handler))
            .route("/health", get(|| async { "OK" }))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.listener.request_timeout_secs,
                    )))
                    .layer(propagate_request_id_layer()),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, dependency = %self.config.remote.name, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn respond(endpoint: &'static str, headers: &HeaderMap, result: Result<String, ResilienceError>) -> Response {
    let response = match result {
        Ok(body) => body.into_response(),
        Err(e) => {
            tracing::warn!(request_id = %request_id(headers), endpoint, error = %e, "Call failed");
            AppError::from(e).into_response()
        }
    };
    metrics::record_request(endpoint, response.status().as_u16());
    response
}

async fn retry_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    respond("retry", &headers, state.client.call_with_retry_only().await)
}

async fn retry_for_service_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    respond(
        "retry-for-service",
        &headers,
        state.client.call_with_retry_only().await,
    )
}

async fn retry_for_service2_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    respond(
        "retry-for-service2",
        &headers,
        state.client.call_with_shared_retry_policy().await,
    )
}

async fn circuit_breaker_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    respond(
        "circuit-breaker",
        &headers,
        state.client.call_with_circuit_breaker_only().await,
    )
}

async fn circuit_breaker_and_retry_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    respond(
        "circuit-breaker-and-retry",
        &headers,
        state.client.call_with_circuit_breaker_and_retry().await,
    )
}

/// The simulated dependency: fail on request, otherwise sleep then answer.
async fn sleep_handler(
    State(state): State<AppState>,
    Path(is_error): Path<bool>,
) -> Result<&'static str, AppError> {
    if is_error {
        return Err(AppError::SimulatedFailure);
    }
    tokio::time::sleep(state.sleep_duration).await;
    Ok("OK")
}

async fn breakers_handler(State(state): State<AppState>) -> Json<Vec<BreakerSnapshot>> {
    // Make sure the client's own breaker shows up even before its first call.
    state.client.breaker();
    Json(state.client.breakers().snapshots())
}
