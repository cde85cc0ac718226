//! End-to-end artifact download: validate, fetch with retries, stream to
//! disk, verify.
//!
//! Content is written to `<destination>.part` and hashed while streaming.
//! The partial file is renamed onto the destination only after the body is
//! complete and the checksum (when one was supplied) matches; on any failure
//! it is removed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use super::checksum::{ChecksumHasher, is_sha256_hex, verify_digest};
use super::client::{ClientTimeouts, build_client};
use super::constants::{MAX_CHECKSUM_DOCUMENT_BYTES, PARTIAL_SUFFIX};
use super::error::{Cause, DownloadError};
use super::fetcher::{Fetcher, Transport};
use super::request::RequestBuilder;
use super::retry::RetryPolicy;
use super::sanitize::{sanitize_path, sanitize_url};

/// What to download and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Source URL (validated before any network activity).
    pub url: String,
    /// Final path of the artifact.
    pub destination: PathBuf,
    /// Expected SHA-256 hex digest; verification is skipped when `None`.
    pub expected_checksum: Option<String>,
}

impl DownloadRequest {
    /// Creates a request without checksum verification.
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            expected_checksum: None,
        }
    }

    /// Requires the downloaded content to match `checksum`.
    #[must_use]
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.expected_checksum = Some(checksum.into());
        self
    }
}

/// Outcome of a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// Always true; failures are reported as errors.
    pub success: bool,
    /// Number of bytes written to the destination.
    pub bytes_written: u64,
    /// Lowercase hex SHA-256 of the written content.
    pub final_checksum: String,
    /// Where the artifact was written.
    pub path: PathBuf,
}

/// Tunables for [`Downloader::new`].
#[derive(Debug, Clone, Default)]
pub struct DownloaderSettings {
    /// HTTP client timeouts.
    pub timeouts: ClientTimeouts,
    /// Retry behavior of the fetcher.
    pub retry_policy: RetryPolicy,
}

/// Downloads artifacts through the request builder and the retrying fetcher.
#[derive(Clone)]
pub struct Downloader {
    builder: RequestBuilder,
    fetcher: Fetcher,
    progress: ProgressBar,
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("builder", &self.builder)
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl Downloader {
    /// Builds a downloader with a fresh HTTP client.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error if the client cannot be created.
    pub fn new(settings: DownloaderSettings) -> Result<Self, reqwest::Error> {
        let client = build_client(settings.timeouts)?;
        let builder = RequestBuilder::new(client.clone());
        let fetcher = Fetcher::new(Arc::new(client), settings.retry_policy);
        Ok(Self::from_parts(builder, fetcher))
    }

    /// Assembles a downloader from an existing builder and fetcher.
    #[must_use]
    pub fn from_parts(builder: RequestBuilder, fetcher: Fetcher) -> Self {
        Self {
            builder,
            fetcher,
            progress: ProgressBar::hidden(),
        }
    }

    /// Builds a downloader whose requests are sent through `transport`.
    ///
    /// Requests are still constructed (and validated) with a default client.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>, retry_policy: RetryPolicy) -> Self {
        let builder = RequestBuilder::new(reqwest::Client::new());
        Self::from_parts(builder, Fetcher::new(transport, retry_policy))
    }

    /// Reports byte progress on `progress` (hidden by default).
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Returns the fetcher's retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        self.fetcher.policy()
    }

    /// Downloads `request.url` to `request.destination`.
    ///
    /// # Errors
    ///
    /// Returns a validation, network, I/O, or checksum [`DownloadError`].
    /// No file is left at the destination (or its partial path) on error.
    #[instrument(
        skip(self, request),
        fields(url = %sanitize_url(&request.url), file = %sanitize_path(&request.destination))
    )]
    pub async fn download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadResult, DownloadError> {
        let http_request = self.builder.build(&request.url)?;
        let fetched = self.fetcher.execute(http_request).await?;
        debug!(attempts = fetched.attempts, "response accepted");

        let partial = partial_path(&request.destination);
        let outcome = self
            .write_verified(
                &request.url,
                &partial,
                &request.destination,
                fetched.response,
                request.expected_checksum.as_deref(),
            )
            .await;

        match outcome {
            Ok((bytes_written, final_checksum)) => {
                if let Err(e) = tokio::fs::rename(&partial, &request.destination).await {
                    remove_partial(&partial).await;
                    return Err(DownloadError::io(&request.url, &request.destination, e));
                }
                info!(bytes = bytes_written, "download complete");
                Ok(DownloadResult {
                    success: true,
                    bytes_written,
                    final_checksum,
                    path: request.destination.clone(),
                })
            }
            Err(error) => {
                remove_partial(&partial).await;
                Err(error)
            }
        }
    }

    /// Fetches a published `.sha256` document and returns its digest.
    ///
    /// The digest is the first whitespace-separated token of the document,
    /// lower-cased.
    ///
    /// # Errors
    ///
    /// Returns [`Cause::ChecksumUnavailable`] when the document is too large
    /// or does not start with a SHA-256 hex digest, or any fetch error.
    #[instrument(skip(self, url), fields(url = %sanitize_url(url)))]
    pub async fn fetch_checksum(&self, url: &str) -> Result<String, DownloadError> {
        let http_request = self.builder.build(url)?;
        let fetched = self.fetcher.execute(http_request).await?;

        if let Some(declared) = fetched.response.content_length()
            && declared > MAX_CHECKSUM_DOCUMENT_BYTES as u64
        {
            warn!(len = declared, "checksum document too large");
            return Err(DownloadError::download(url, None, Cause::ChecksumUnavailable));
        }

        let mut body = Vec::new();
        let mut stream = fetched.response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::transport(url, e))?;
            if body.len() + chunk.len() > MAX_CHECKSUM_DOCUMENT_BYTES {
                warn!(
                    len = body.len() + chunk.len(),
                    "checksum document too large"
                );
                return Err(DownloadError::download(url, None, Cause::ChecksumUnavailable));
            }
            body.extend_from_slice(&chunk);
        }

        let text = String::from_utf8_lossy(&body);
        match text.split_whitespace().next() {
            Some(token) if is_sha256_hex(token) => Ok(token.to_ascii_lowercase()),
            _ => Err(DownloadError::download(url, None, Cause::ChecksumUnavailable)),
        }
    }

    async fn write_verified(
        &self,
        url: &str,
        partial: &Path,
        destination: &Path,
        response: reqwest::Response,
        expected_checksum: Option<&str>,
    ) -> Result<(u64, String), DownloadError> {
        let file = File::create(partial)
            .await
            .map_err(|e| DownloadError::io(url, destination, e))?;

        if let Some(total) = response.content_length() {
            self.progress.set_length(total);
        }
        self.progress.set_position(0);

        let (bytes_written, digest) = self
            .stream_to_file(file, response, url, destination)
            .await?;
        self.progress.finish_and_clear();

        if let Some(expected) = expected_checksum {
            verify_digest(destination, &digest, expected)?;
        }
        Ok((bytes_written, digest))
    }

    async fn stream_to_file(
        &self,
        file: File,
        response: reqwest::Response,
        url: &str,
        destination: &Path,
    ) -> Result<(u64, String), DownloadError> {
        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut hasher = ChecksumHasher::new();
        let mut bytes_written: u64 = 0;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| DownloadError::transport(url, e))?;

            writer
                .write_all(&chunk)
                .await
                .map_err(|e| DownloadError::io(url, destination, e))?;
            hasher.update(&chunk);

            bytes_written += chunk.len() as u64;
            self.progress.inc(chunk.len() as u64);
        }

        writer
            .flush()
            .await
            .map_err(|e| DownloadError::io(url, destination, e))?;

        Ok((bytes_written, hasher.finalize_hex()))
    }
}

/// Returns a byte progress bar for interactive downloads.
#[must_use]
pub fn byte_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:40}] {bytes}/{total_bytes} ({bytes_per_sec})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

/// Returns `<destination>.part`.
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

async fn remove_partial(partial: &Path) {
    debug!(file = %sanitize_path(partial), "removing partial download");
    match tokio::fs::remove_file(partial).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(file = %sanitize_path(partial), error = %e, "failed to remove partial download");
        }
    }
}
