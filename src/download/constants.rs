//! Constants for the download module (timeouts, redirects, excerpts).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large archives).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Maximum redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// Maximum size accepted for a published checksum document.
pub const MAX_CHECKSUM_DOCUMENT_BYTES: usize = 4096;

/// Suffix appended to the destination while a download is in flight.
pub const PARTIAL_SUFFIX: &str = "part";
