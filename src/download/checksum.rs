//! SHA-256 verification of downloaded artifacts.
//!
//! Digests are compared case-insensitively: both sides are lower-cased and
//! whitespace around the expected value is ignored, so digests copied from
//! release pages in either case are accepted.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::error::DownloadError;

/// Length of a hex-encoded SHA-256 digest.
pub const SHA256_HEX_LEN: usize = 64;

/// Incremental SHA-256 hasher for streamed content.
#[derive(Debug, Clone, Default)]
pub struct ChecksumHasher {
    inner: Sha256,
}

impl ChecksumHasher {
    /// Creates an empty hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of content.
    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
    }

    /// Finishes hashing and returns the lowercase hex digest.
    #[must_use]
    pub fn finalize_hex(self) -> String {
        hex::encode(self.inner.finalize())
    }
}

/// Returns the lowercase hex SHA-256 digest of `content`.
#[must_use]
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = ChecksumHasher::new();
    hasher.update(content);
    hasher.finalize_hex()
}

/// Returns true when `candidate` looks like a hex SHA-256 digest.
#[must_use]
pub fn is_sha256_hex(candidate: &str) -> bool {
    let trimmed = candidate.trim();
    trimmed.len() == SHA256_HEX_LEN && trimmed.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Verifies fully-read `content` against `expected_hex`.
///
/// `file_path` only labels the error; it is reduced to its base name.
/// Returns the computed digest on success.
///
/// # Errors
///
/// Returns [`DownloadError::Checksum`] carrying both digests on mismatch.
///
/// # Examples
///
/// ```
/// use go_installer::download::{sha256_hex, verify_checksum};
/// use std::path::Path;
///
/// let content = b"toolchain bytes";
/// let digest = sha256_hex(content);
/// assert!(verify_checksum(Path::new("go.tar.gz"), content, &digest).is_ok());
/// assert!(verify_checksum(Path::new("go.tar.gz"), content, "00").is_err());
/// ```
pub fn verify_checksum(
    file_path: &Path,
    content: &[u8],
    expected_hex: &str,
) -> Result<String, DownloadError> {
    let actual = sha256_hex(content);
    verify_digest(file_path, &actual, expected_hex)?;
    Ok(actual)
}

/// Compares an already computed digest against `expected_hex`.
///
/// # Errors
///
/// Returns [`DownloadError::Checksum`] carrying both digests on mismatch.
pub fn verify_digest(
    file_path: &Path,
    actual_hex: &str,
    expected_hex: &str,
) -> Result<(), DownloadError> {
    let expected = expected_hex.trim().to_ascii_lowercase();
    let actual = actual_hex.to_ascii_lowercase();

    if expected == actual {
        debug!(digest = %actual, "checksum verified");
        Ok(())
    } else {
        warn!(%expected, %actual, "checksum mismatch");
        Err(DownloadError::checksum(file_path, expected, actual))
    }
}
