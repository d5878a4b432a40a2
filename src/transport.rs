//! Request transport: one GET per query, bounded by a deadline
//!
//! The [`Transport`] trait is the seam the dispatcher fetches through. [`HttpTransport`]
//! is the production implementation on top of reqwest; tests substitute scripted
//! implementations.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::Config;
use crate::error::{FailureReason, Result};
use crate::types::{Outcome, Query};

/// Performs a single request for a query
///
/// Implementations must return within (roughly) `timeout` and must never retry.
/// Every failure is reported as an [`Outcome::Failure`], never as a panic or error.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url`, giving up with [`FailureReason::Timeout`] once `timeout` elapses
    async fn fetch(&self, url: &Query, timeout: Duration) -> Outcome;

    /// Human-readable name for logging
    fn name(&self) -> &'static str {
        "transport"
    }
}

/// HTTP GET transport backed by a shared reqwest client
///
/// The deadline covers the whole exchange: connecting, receiving headers and reading
/// the body. Status is checked before the body is decoded.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with its own client
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`](crate::Error::Network) if the client cannot be built
    /// (e.g. the TLS backend fails to initialise).
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    /// Create a transport using the configured user agent
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.user_agent)
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn exchange(
        &self,
        url: &Query,
        timeout: Duration,
    ) -> std::result::Result<serde_json::Value, FailureReason> {
        let response = self
            .client
            .get(url.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureReason::NonOkStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(classify_request_error)?;

        serde_json::from_slice(&body).map_err(|e| FailureReason::Decode(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &Query, timeout: Duration) -> Outcome {
        let outcome = match tokio::time::timeout(timeout, self.exchange(url, timeout)).await {
            Ok(result) => Outcome::from(result),
            Err(_) => Outcome::Failure(FailureReason::Timeout),
        };

        if let Outcome::Failure(reason) = &outcome {
            tracing::debug!(url = %url, reason = reason.code(), error = %reason, "request failed");
        }

        outcome
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Map a reqwest error onto the failure taxonomy
///
/// reqwest enforces its own copy of the deadline; when that fires first the error
/// is still a timeout.
fn classify_request_error(error: reqwest::Error) -> FailureReason {
    if error.is_timeout() {
        FailureReason::Timeout
    } else {
        FailureReason::Transport(error.to_string())
    }
}
