//! Go toolchain installer library.
//!
//! Downloads, verifies, installs, updates, and removes Go toolchain
//! archives.
//!
//! # Architecture
//!
//! - [`download`] - URL validation, request building, retrying fetch,
//!   response header audit, checksum verification, sanitized errors
//! - [`install`] - platform naming, archive extraction, install/update/
//!   uninstall workflows, privilege elevation
//! - [`user_agent`] - the `User-Agent` sent with every request

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod install;
pub mod user_agent;

// Re-export commonly used types
pub use download::{
    Cause, DownloadError, DownloadRequest, DownloadResult, Downloader, DownloaderSettings,
    RetryPolicy, ValidationError, validate_url,
};
pub use install::{InstallError, Installer, InstallerSettings, Platform, UninstallOutcome};
