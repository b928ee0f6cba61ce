//! Response handling.
//!
//! # Responsibilities
//! - Map resilience outcomes to HTTP status codes
//! - Render error bodies as plain text
//!
//! # Design Decisions
//! - Exhausted or non-retryable upstream failures → 502 Bad Gateway
//! - Upstream timeouts → 504 Gateway Timeout
//! - An open circuit that reaches this layer → 503 Service Unavailable

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::resilience::ResilienceError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Resilience(#[from] ResilienceError),

    /// Failure requested from the simulated endpoint.
    #[error("simulated failure")]
    SimulatedFailure,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::SimulatedFailure => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Resilience(ResilienceError::CircuitOpen { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Resilience(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            AppError::Resilience(ResilienceError::Aborted(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Resilience(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CallError;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        let exhausted = AppError::from(ResilienceError::RetryExhausted {
            attempts: 3,
            last: CallError::Transient("500".into()),
        });
        assert_eq!(exhausted.status(), StatusCode::BAD_GATEWAY);

        let timed_out = AppError::from(ResilienceError::RetryExhausted {
            attempts: 3,
            last: CallError::Timeout(Duration::from_secs(10)),
        });
        assert_eq!(timed_out.status(), StatusCode::GATEWAY_TIMEOUT);

        let open = AppError::from(ResilienceError::CircuitOpen { name: "test".into() });
        assert_eq!(open.status(), StatusCode::SERVICE_UNAVAILABLE);

        assert_eq!(
            AppError::SimulatedFailure.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
