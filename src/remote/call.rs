//! Outbound HTTP call to the flaky endpoint.
//!
//! # Responsibilities
//! - Issue `GET <base>/sleep/{simulate_error}`
//! - Classify transport failures and status codes into `CallError`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::resilience::CallError;

/// Transport for one remote call.
#[async_trait]
pub trait RemoteCall: Send + Sync {
    /// Ask the dependency to either fail (`true`) or sleep and answer `"OK"`.
    async fn sleep(&self, simulate_error: bool) -> Result<String, CallError>;
}

#[derive(Debug, Error)]
pub enum RemoteSetupError {
    #[error("invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// `RemoteCall` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRemoteCall {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpRemoteCall {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteSetupError> {
        let base_url = Url::parse(base_url)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn sleep_url(&self, simulate_error: bool) -> String {
        format!(
            "{}/sleep/{}",
            self.base_url.as_str().trim_end_matches('/'),
            simulate_error
        )
    }

    fn classify(&self, err: reqwest::Error) -> CallError {
        if err.is_timeout() {
            CallError::Timeout(self.timeout)
        } else {
            CallError::Transient(err.to_string())
        }
    }
}

/// Map a non-success status to a call error.
pub fn classify_status(status: StatusCode, url: &str) -> CallError {
    let message = format!("{url} returned {status}");
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        CallError::Transient(message)
    } else {
        CallError::Permanent(message)
    }
}

#[async_trait]
impl RemoteCall for HttpRemoteCall {
    async fn sleep(&self, simulate_error: bool) -> Result<String, CallError> {
        let url = self.sleep_url(simulate_error);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, &url));
        }
        response.text().await.map_err(|e| self.classify(e))
    }
}
