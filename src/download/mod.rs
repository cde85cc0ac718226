//! Download subsystem for toolchain archives.
//!
//! The pieces compose in a fixed order:
//!
//! 1. [`validate_url`] refuses non-HTTPS, local/private hosts, and traversal.
//! 2. [`RequestBuilder`] builds the GET request with the fixed header set.
//! 3. [`Fetcher`] executes it with bounded retries ([`RetryPolicy`]) and
//!    audits every response's security headers.
//! 4. [`Downloader`] streams the body to disk and verifies the SHA-256.
//!
//! Errors are [`DownloadError`] values whose URLs and paths are sanitized at
//! construction time.
//!
//! # Example
//!
//! ```no_run
//! use go_installer::download::{DownloadRequest, Downloader, DownloaderSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = Downloader::new(DownloaderSettings::default())?;
//! let result = downloader
//!     .download(&DownloadRequest::new(
//!         "https://dl.google.com/go/go1.22.0.linux-amd64.tar.gz",
//!         "/tmp/go1.22.0.linux-amd64.tar.gz",
//!     ))
//!     .await?;
//! println!("{} bytes, sha256 {}", result.bytes_written, result.final_checksum);
//! # Ok(())
//! # }
//! ```

mod audit;
mod checksum;
mod client;
mod constants;
mod downloader;
mod error;
mod fetcher;
mod request;
mod retry;
mod sanitize;
mod validate;

pub use audit::{SecurityWarnings, audit_headers, audit_response};
pub use checksum::{ChecksumHasher, is_sha256_hex, sha256_hex, verify_checksum, verify_digest};
pub use client::{ClientTimeouts, build_client};
pub use constants::{CONNECT_TIMEOUT_SECS, MAX_REDIRECTS, READ_TIMEOUT_SECS};
pub use downloader::{
    DownloadRequest, DownloadResult, Downloader, DownloaderSettings, byte_progress_bar,
};
pub use error::{Cause, DownloadError};
pub use fetcher::{DownloadAttempt, FetchedResponse, Fetcher, Transport};
pub use request::{ACCEPT_ENCODING_VALUE, RequestBuilder};
pub use retry::{
    Backoff, DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy,
    classify_status, classify_transport_error,
};
pub use sanitize::{UNKNOWN, sanitize_path, sanitize_url};
pub use validate::{ValidationError, validate_url};

// Note: no module-local Result alias; signatures spell out
// `Result<T, DownloadError>`.
