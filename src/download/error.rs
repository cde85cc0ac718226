//! Error types for the download module.
//!
//! Every variant stores URLs and paths in sanitized form (see
//! [`sanitize_url`] and [`sanitize_path`]); the scrubbing happens in the
//! constructors, so a raw query string or directory layout can never be
//! rendered by `Display` or `Debug`.

use std::path::Path;

use thiserror::Error;

use super::sanitize::{sanitize_path, sanitize_url};
use super::validate::ValidationError;

/// Underlying reason attached to every [`DownloadError`].
#[derive(Debug, Error)]
pub enum Cause {
    /// The URL was refused before any request was built.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server answered with a status that does not yield the artifact.
    #[error("download failed")]
    DownloadFailed,

    /// The digest of the downloaded content differs from the expected one.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// A published checksum document could not be used.
    #[error("checksum document is not a SHA-256 hex digest")]
    ChecksumUnavailable,

    /// The request could not be replayed for a retry.
    #[error("request body cannot be replayed")]
    UnrepeatableRequest,

    /// Transport-level failure (connect, TLS, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Local filesystem failure while writing the artifact.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

impl Cause {
    /// Wraps a reqwest error, stripping the URL it carries.
    #[must_use]
    pub fn transport(error: reqwest::Error) -> Self {
        Self::Transport(error.without_url())
    }
}

/// Errors surfaced by the download core.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Failure that is neither an HTTP status nor a checksum problem:
    /// validation, local I/O, unusable checksum documents.
    #[error("failed to download {url}{}: {cause}", destination_suffix(.destination))]
    Download {
        /// Sanitized source URL.
        url: String,
        /// Base filename of the destination, when one is known.
        destination: Option<String>,
        /// The wrapped cause.
        #[source]
        cause: Cause,
    },

    /// Network failure: transport error (`status_code == 0`) or an HTTP status
    /// other than 200.
    #[error("network error downloading {url} (status {status_code}{}): {cause}", excerpt_suffix(.response_excerpt))]
    Network {
        /// HTTP status, or 0 when no response was received.
        status_code: u16,
        /// Sanitized source URL.
        url: String,
        /// Canonical reason phrase for the status, when known.
        response_excerpt: Option<String>,
        /// The wrapped cause.
        #[source]
        cause: Cause,
    },

    /// The downloaded content does not match the expected digest.
    #[error("checksum mismatch for {file_path}: expected {expected}, got {actual}")]
    Checksum {
        /// Base filename of the verified file.
        file_path: String,
        /// Expected digest (hex).
        expected: String,
        /// Computed digest (hex).
        actual: String,
        /// Always [`Cause::ChecksumMismatch`].
        #[source]
        cause: Cause,
    },
}

fn destination_suffix(destination: &Option<String>) -> String {
    destination
        .as_deref()
        .map_or_else(String::new, |name| format!(" to {name}"))
}

fn excerpt_suffix(excerpt: &Option<String>) -> String {
    excerpt
        .as_deref()
        .map_or_else(String::new, |text| format!(" {text}"))
}

impl DownloadError {
    /// Creates a general download error.
    pub fn download(url: &str, destination: Option<&Path>, cause: impl Into<Cause>) -> Self {
        Self::Download {
            url: sanitize_url(url),
            destination: destination.map(sanitize_path),
            cause: cause.into(),
        }
    }

    /// Creates a validation error for a URL that was refused.
    pub fn validation(url: &str, error: ValidationError) -> Self {
        Self::download(url, None, error)
    }

    /// Creates a network error.
    pub fn network(
        status_code: u16,
        url: &str,
        response_excerpt: Option<String>,
        cause: Cause,
    ) -> Self {
        Self::Network {
            status_code,
            url: sanitize_url(url),
            response_excerpt,
            cause,
        }
    }

    /// Creates a network error from a transport failure.
    pub fn transport(url: &str, error: reqwest::Error) -> Self {
        Self::network(0, url, None, Cause::transport(error))
    }

    /// Creates an I/O error for a local write.
    pub fn io(url: &str, destination: &Path, error: std::io::Error) -> Self {
        Self::download(url, Some(destination), Cause::Io(error))
    }

    /// Creates a checksum mismatch error.
    pub fn checksum(
        file_path: impl AsRef<Path>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Checksum {
            file_path: sanitize_path(file_path),
            expected: expected.into(),
            actual: actual.into(),
            cause: Cause::ChecksumMismatch,
        }
    }

    /// Returns the wrapped cause.
    #[must_use]
    pub fn cause(&self) -> &Cause {
        match self {
            Self::Download { cause, .. }
            | Self::Network { cause, .. }
            | Self::Checksum { cause, .. } => cause,
        }
    }

    /// Returns the validation failure, if this error is one.
    #[must_use]
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self.cause() {
            Cause::Validation(error) => Some(error),
            _ => None,
        }
    }

    /// Returns the HTTP status for network errors (0 for transport failures).
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Network { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}
