//! Toolchain install, update, download-only, and uninstall workflows.
//!
//! Built on the [`crate::download`] core: archive URLs are derived from the
//! host [`Platform`], downloaded and verified by the
//! [`Downloader`](crate::download::Downloader), then unpacked with
//! [`extract_archive`].

mod archive;
mod elevate;
mod error;
mod installer;
mod platform;
mod uninstall;

pub use archive::{
    ExtractionSummary, extract_archive, extract_archive_blocking, extract_tar_gz, extract_zip,
};
pub use elevate::{ELEVATED_FLAG, Elevation, elevate_and_execute, is_writable};
pub use error::InstallError;
pub use installer::{
    DEFAULT_BASE_URL, InstallReport, Installer, InstallerSettings, default_install_dir,
};
pub use platform::{ArchiveKind, Platform, normalize_version};
pub use uninstall::{UninstallOutcome, uninstall};
