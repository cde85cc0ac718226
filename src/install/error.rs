//! Error types for the install workflow.

use std::path::Path;

use thiserror::Error;

use crate::download::{DownloadError, sanitize_path};

/// Errors from installing, updating, or removing a toolchain.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The host OS/architecture has no published toolchain archive.
    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform {
        /// Host OS as reported by Rust.
        os: String,
        /// Host architecture as reported by Rust.
        arch: String,
    },

    /// The requested version string is malformed.
    #[error("invalid version {version:?}: expected digits and dots, e.g. 1.22.3")]
    InvalidVersion {
        /// The rejected input.
        version: String,
    },

    /// `install` was asked to overwrite an existing toolchain.
    #[error("a toolchain is already installed at {path}; use update to replace it")]
    AlreadyInstalled {
        /// Base name of the install directory.
        path: String,
    },

    /// The archive does not contain the expected top-level `go/` directory.
    #[error("archive {archive} has no top-level go/ directory")]
    UnexpectedLayout {
        /// Base name of the archive.
        archive: String,
    },

    /// The archive could not be read or unpacked.
    #[error("failed to extract {archive}: {message}")]
    Extraction {
        /// Base name of the archive.
        archive: String,
        /// What went wrong.
        message: String,
    },

    /// Downloading or verifying the archive failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Local filesystem failure.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Base name of the path involved.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Re-running the command with elevated privileges failed.
    #[error("elevated command failed: {message}")]
    Elevation {
        /// What went wrong.
        message: String,
    },
}

impl InstallError {
    /// Creates an I/O error, keeping only the base name of `path`.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: sanitize_path(path),
            source,
        }
    }

    /// Creates an extraction error for `archive`.
    pub fn extraction(archive: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Extraction {
            archive: sanitize_path(archive),
            message: message.into(),
        }
    }

    /// Creates an already-installed error for `path`.
    pub fn already_installed(path: impl AsRef<Path>) -> Self {
        Self::AlreadyInstalled {
            path: sanitize_path(path),
        }
    }

    /// Creates an unexpected-layout error for `archive`.
    pub fn unexpected_layout(archive: impl AsRef<Path>) -> Self {
        Self::UnexpectedLayout {
            archive: sanitize_path(archive),
        }
    }
}
