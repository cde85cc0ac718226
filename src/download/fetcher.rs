//! Retrying execution of download requests.
//!
//! [`Fetcher::execute`] sends a request through a [`Transport`], retrying
//! transport failures, 5xx, and 429 responses under a [`RetryPolicy`].
//! Every received response is passed through the security header audit.
//! Responses that are not returned to the caller are dropped (closing their
//! body) before the next attempt or before the error is returned.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Request, Response};
use tracing::{debug, info, instrument, warn};

use super::audit::{SecurityWarnings, audit_response};
use super::error::{Cause, DownloadError};
use super::retry::{RetryDecision, RetryPolicy, classify_status, classify_transport_error};
use super::sanitize::sanitize_url;

/// Sends a single HTTP request.
///
/// Implemented for [`reqwest::Client`]; tests substitute counting or
/// host-rewriting transports.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the raw response.
    async fn send(&self, request: Request) -> Result<Response, reqwest::Error>;
}

#[async_trait]
impl Transport for Client {
    async fn send(&self, request: Request) -> Result<Response, reqwest::Error> {
        self.execute(request).await
    }
}

/// Bookkeeping for one iteration of the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadAttempt {
    /// Zero-based attempt number.
    pub attempt_number: u32,
    /// HTTP status, when a response was received.
    pub status_code: Option<u16>,
    /// Rendered error, when the attempt failed.
    pub error: Option<String>,
}

/// A successful (HTTP 200) response with its fetch metadata.
#[derive(Debug)]
pub struct FetchedResponse {
    /// The open response; the caller reads and closes the body.
    pub response: Response,
    /// Number of attempts made, including the successful one.
    pub attempts: u32,
    /// Security header warnings from the successful response.
    pub warnings: SecurityWarnings,
}

/// Executes requests with bounded retries.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Creates a fetcher over the given transport and retry policy.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends `request`, retrying per the policy, until a 200 response arrives
    /// or the failure is final.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Network`] with status 0 for exhausted transport
    /// failures, or the last HTTP status for non-200 responses.
    #[instrument(skip(self, request), fields(url = %sanitize_url(request.url().as_str())))]
    pub async fn execute(&self, request: Request) -> Result<FetchedResponse, DownloadError> {
        let url = request.url().clone();
        let safe_url = sanitize_url(url.as_str());
        let request_was_https = url.scheme() == "https";
        let mut attempt = 0u32;

        loop {
            let Some(outgoing) = request.try_clone() else {
                return Err(DownloadError::download(
                    url.as_str(),
                    None,
                    Cause::UnrepeatableRequest,
                ));
            };

            debug!(attempt, "sending request");

            let (failure_type, error, record) = match self.transport.send(outgoing).await {
                Ok(response) => {
                    let status = response.status();
                    let warnings = audit_response(&response, request_was_https);
                    for warning in warnings.iter() {
                        warn!(url = %safe_url, status = status.as_u16(), %warning, "response security audit");
                    }

                    if status == reqwest::StatusCode::OK {
                        debug!(attempt, "response received");
                        return Ok(FetchedResponse {
                            response,
                            attempts: attempt + 1,
                            warnings,
                        });
                    }

                    drop(response);

                    let code = status.as_u16();
                    let error = DownloadError::network(
                        code,
                        url.as_str(),
                        status.canonical_reason().map(str::to_string),
                        Cause::DownloadFailed,
                    );
                    let record = DownloadAttempt {
                        attempt_number: attempt,
                        status_code: Some(code),
                        error: Some(error.to_string()),
                    };
                    (classify_status(code), error, record)
                }
                Err(transport_error) => {
                    let failure_type = classify_transport_error(&transport_error);
                    let error = DownloadError::transport(url.as_str(), transport_error);
                    let record = DownloadAttempt {
                        attempt_number: attempt,
                        status_code: None,
                        error: Some(error.to_string()),
                    };
                    (failure_type, error, record)
                }
            };

            debug!(?record, ?failure_type, "attempt failed");

            match self.policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    info!(
                        url = %safe_url,
                        attempt = next_attempt,
                        max_retries = self.policy.max_retries(),
                        delay_ms = delay.as_millis(),
                        %error,
                        "retrying download"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next_attempt;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(url = %safe_url, %reason, "not retrying download");
                    return Err(error);
                }
            }
        }
    }
}
