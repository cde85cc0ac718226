//! Outbound GET request construction.

use reqwest::header::{ACCEPT, ACCEPT_ENCODING, USER_AGENT};
use reqwest::{Client, Request};
use tracing::{debug, instrument};

use super::error::DownloadError;
use super::sanitize::sanitize_url;
use super::validate::validate_url;
use crate::user_agent;

/// `Accept-Encoding` value sent with every request.
pub const ACCEPT_ENCODING_VALUE: &str = "gzip, deflate, br";

/// Builds validated GET requests with the fixed download header set.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    client: Client,
    user_agent: String,
}

impl RequestBuilder {
    /// Creates a builder that stamps the default `<product>/<version>` User-Agent.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            user_agent: user_agent::default_user_agent(),
        }
    }

    /// Overrides the User-Agent header value.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the User-Agent the builder sends.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Validates `raw_url` and builds a GET request for it.
    ///
    /// # Errors
    ///
    /// Returns a [`DownloadError::Download`] wrapping the validation failure,
    /// or a transport error if the request cannot be assembled.
    #[instrument(skip(self, raw_url), fields(url = %sanitize_url(raw_url)))]
    pub fn build(&self, raw_url: &str) -> Result<Request, DownloadError> {
        let url = validate_url(raw_url).map_err(|e| DownloadError::validation(raw_url, e))?;

        let request = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "*/*")
            .header(ACCEPT_ENCODING, ACCEPT_ENCODING_VALUE)
            .build()
            .map_err(|e| DownloadError::transport(raw_url, e))?;

        debug!("request built");
        Ok(request)
    }
}
