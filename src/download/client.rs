//! Construction of the underlying reqwest client.
//!
//! The client is built once per download invocation and carries the
//! timeouts, transparent decompression, and a redirect policy that re-runs
//! URL validation on every hop.

use std::time::Duration;

use reqwest::Client;
use reqwest::redirect::Policy;
use tracing::{debug, warn};

use super::constants::{CONNECT_TIMEOUT_SECS, MAX_REDIRECTS, READ_TIMEOUT_SECS};
use super::sanitize::sanitize_url;
use super::validate::validate_url;

/// Timeouts applied to the HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    /// Connect timeout in seconds.
    pub connect_secs: u64,
    /// Whole-request timeout in seconds (covers reading the body).
    pub read_secs: u64,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: CONNECT_TIMEOUT_SECS,
            read_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// Builds the HTTP client used for downloads.
///
/// # Errors
///
/// Returns the reqwest builder error if the TLS backend cannot be initialized.
pub fn build_client(timeouts: ClientTimeouts) -> Result<Client, reqwest::Error> {
    debug!(
        connect_secs = timeouts.connect_secs,
        read_secs = timeouts.read_secs,
        "building HTTP client"
    );
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.read_secs))
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .redirect(validating_redirect_policy())
        .build()
}

/// Follows redirects only to targets that pass URL validation.
///
/// After [`MAX_REDIRECTS`] hops the 3xx response is handed back unfollowed.
fn validating_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            warn!(hops = attempt.previous().len(), "redirect limit reached");
            return attempt.stop();
        }

        match validate_url(attempt.url().as_str()) {
            Ok(_) => attempt.follow(),
            Err(error) => {
                warn!(
                    target_url = %sanitize_url(attempt.url().as_str()),
                    %error,
                    "refusing redirect to disallowed URL"
                );
                attempt.error(error)
            }
        }
    })
}
