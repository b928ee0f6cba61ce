//! Call-mode scenarios for `ResilientClient` over an in-memory dependency.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{client_with, InMemoryRemote};
use resilience_demo::remote::{FixedDecision, ScriptedDecision};
use resilience_demo::resilience::{
    CircuitBreakerConfig, CircuitState, ErrorKind, ResilienceError, RetryPolicy,
};

fn small_breaker() -> CircuitBreakerConfig {
    CircuitBreakerConfig::default()
        .sliding_window_size(4)
        .failure_rate_threshold(0.5)
        .open_duration(Duration::from_secs(60))
        .half_open_trial_calls(1)
        .call_timeout(Duration::from_secs(1))
}

#[tokio::test]
async fn test_retry_only_exhausts_after_three_attempts() {
    let remote = Arc::new(InMemoryRemote::default());
    let client = client_with(
        remote.clone(),
        Arc::new(FixedDecision(true)),
        RetryPolicy::default(),
        small_breaker(),
    );

    let err = client.call_with_retry_only().await.unwrap_err();

    assert!(matches!(err, ResilienceError::RetryExhausted { attempts: 3, .. }));
    assert_eq!(remote.calls(), 3);
}

#[tokio::test]
async fn test_retry_only_recovers_on_third_attempt() {
    let remote = Arc::new(InMemoryRemote::default());
    let client = client_with(
        remote.clone(),
        Arc::new(ScriptedDecision::new([true, true], false)),
        RetryPolicy::default(),
        small_breaker(),
    );

    assert_eq!(client.call_with_retry_only().await.unwrap(), "OK");
    assert_eq!(remote.calls(), 3);
}

#[tokio::test]
async fn test_non_retryable_kind_fails_on_first_attempt() {
    let remote = Arc::new(InMemoryRemote::default());
    let policy = RetryPolicy::default().retry_on(&[ErrorKind::Timeout]);
    let client = client_with(
        remote.clone(),
        Arc::new(FixedDecision(true)),
        policy,
        small_breaker(),
    );

    let err = client.call_with_retry_only().await.unwrap_err();

    assert!(matches!(err, ResilienceError::NonRetryable { attempt: 1, .. }));
    assert_eq!(remote.calls(), 1);
}

#[tokio::test]
async fn test_shared_executor_is_reused_without_shared_attempt_state() {
    let remote = Arc::new(InMemoryRemote::default());
    let client = client_with(
        remote.clone(),
        Arc::new(FixedDecision(true)),
        RetryPolicy::default(),
        small_breaker(),
    );

    assert_eq!(client.shared_executor().name(), "test");
    for _ in 0..2 {
        let err = client.call_with_shared_retry_policy().await.unwrap_err();
        assert!(matches!(err, ResilienceError::RetryExhausted { attempts: 3, .. }));
    }

    // Each call gets its own full budget.
    assert_eq!(remote.calls(), 6);
}

#[tokio::test]
async fn test_breaker_only_falls_back_then_short_circuits() {
    let remote = Arc::new(InMemoryRemote::default());
    let client = client_with(
        remote.clone(),
        Arc::new(FixedDecision(true)),
        RetryPolicy::default(),
        small_breaker(),
    );

    for _ in 0..4 {
        assert_eq!(client.call_with_circuit_breaker_only().await.unwrap(), "fallback!");
    }
    assert_eq!(client.breaker().state(), CircuitState::Open);
    assert_eq!(remote.calls(), 4);

    assert_eq!(client.call_with_circuit_breaker_only().await.unwrap(), "fallback!");
    assert_eq!(remote.calls(), 4);
}

#[tokio::test]
async fn test_combined_mode_records_one_outcome_per_call() {
    let remote = Arc::new(InMemoryRemote::default());
    let client = client_with(
        remote.clone(),
        Arc::new(FixedDecision(true)),
        RetryPolicy::default(),
        small_breaker(),
    );

    assert_eq!(
        client.call_with_circuit_breaker_and_retry().await.unwrap(),
        "fallback!"
    );

    assert_eq!(remote.calls(), 3);
    let snapshot = client.breaker().snapshot();
    assert_eq!(snapshot.buffered_calls, 1);
    assert_eq!(snapshot.failed_calls, 1);
    assert_eq!(snapshot.state, CircuitState::Closed);
}

#[tokio::test]
async fn test_combined_mode_success_after_retries_counts_as_success() {
    let remote = Arc::new(InMemoryRemote::default());
    let client = client_with(
        remote.clone(),
        Arc::new(ScriptedDecision::new([true, true], false)),
        RetryPolicy::default(),
        small_breaker(),
    );

    assert_eq!(client.call_with_circuit_breaker_and_retry().await.unwrap(), "OK");

    let snapshot = client.breaker().snapshot();
    assert_eq!(snapshot.buffered_calls, 1);
    assert_eq!(snapshot.failed_calls, 0);
}

#[tokio::test]
async fn test_failing_fallback_reaches_caller() {
    let remote = Arc::new(InMemoryRemote::default());
    let client = client_with(
        remote.clone(),
        Arc::new(FixedDecision(true)),
        RetryPolicy::default(),
        small_breaker(),
    )
    .with_fallback(Arc::new(|e: ResilienceError| -> Result<String, ResilienceError> {
        Err(e)
    }));

    let err = client.call_with_circuit_breaker_and_retry().await.unwrap_err();
    assert!(matches!(err, ResilienceError::RetryExhausted { attempts: 3, .. }));

    let err = client.call_with_circuit_breaker_only().await.unwrap_err();
    assert!(matches!(err, ResilienceError::Call(_)));
}

#[tokio::test]
async fn test_open_circuit_error_reaches_failing_fallback() {
    let remote = Arc::new(InMemoryRemote::default());
    let client = client_with(
        remote.clone(),
        Arc::new(FixedDecision(true)),
        RetryPolicy::default(),
        small_breaker(),
    )
    .with_fallback(Arc::new(|e: ResilienceError| -> Result<String, ResilienceError> {
        Err(e)
    }));

    for _ in 0..4 {
        let _ = client.call_with_circuit_breaker_only().await;
    }

    let err = client.call_with_circuit_breaker_only().await.unwrap_err();
    assert_eq!(
        err,
        ResilienceError::CircuitOpen {
            name: "test".to_string()
        }
    );
    assert_eq!(remote.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_slow_dependency_times_out_into_fallback() {
    let remote = Arc::new(InMemoryRemote::new(Duration::from_secs(5)));
    let client = client_with(
        remote.clone(),
        Arc::new(FixedDecision(false)),
        RetryPolicy::default(),
        small_breaker(),
    );

    assert_eq!(client.call_with_circuit_breaker_only().await.unwrap(), "fallback!");

    let snapshot = client.breaker().snapshot();
    assert_eq!(snapshot.failed_calls, 1);
}

#[tokio::test(start_paused = true)]
async fn test_breaker_recovers_through_half_open_trial() {
    let remote = Arc::new(InMemoryRemote::default());
    let breaker = small_breaker().sliding_window_size(2);
    let client = client_with(
        remote.clone(),
        Arc::new(ScriptedDecision::new([true, true], false)),
        RetryPolicy::default(),
        breaker,
    );

    client.call_with_circuit_breaker_only().await.unwrap();
    client.call_with_circuit_breaker_only().await.unwrap();
    assert_eq!(client.breaker().state(), CircuitState::Open);

    tokio::time::advance(Duration::from_secs(61)).await;

    assert_eq!(client.call_with_circuit_breaker_only().await.unwrap(), "OK");
    assert_eq!(client.breaker().state(), CircuitState::Closed);
    assert_eq!(remote.calls(), 3);
}
