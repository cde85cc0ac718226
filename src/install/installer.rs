//! Install, update, and download-only workflows.
//!
//! Archives are always downloaded and verified before the existing
//! installation is touched. Extraction happens in a staging directory next
//! to the install directory, so the final move is a same-filesystem rename.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::archive::extract_archive_blocking;
use super::error::InstallError;
use super::platform::{Platform, normalize_version};
use super::uninstall::{UninstallOutcome, uninstall};
use crate::download::{DownloadRequest, DownloadResult, Downloader, sanitize_path, sanitize_url};

/// Default archive host for Go releases.
pub const DEFAULT_BASE_URL: &str = "https://dl.google.com/go";

/// Default install directory for the host OS.
#[must_use]
pub fn default_install_dir() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\Program Files\Go")
    } else {
        PathBuf::from("/usr/local/go")
    }
}

/// Where and how toolchains are installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerSettings {
    /// Directory that holds the toolchain (`.../go`).
    pub install_dir: PathBuf,
    /// Archive host prefix, e.g. `https://dl.google.com/go`.
    pub base_url: String,
    /// Fetch the published `.sha256` document when no digest is given.
    pub verify_checksum: bool,
    /// Platform whose archive is fetched.
    pub platform: Platform,
}

impl InstallerSettings {
    /// Settings for the host platform with built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::UnsupportedPlatform`] on hosts without a Go
    /// release.
    pub fn for_current_platform() -> Result<Self, InstallError> {
        Ok(Self {
            install_dir: default_install_dir(),
            base_url: DEFAULT_BASE_URL.to_string(),
            verify_checksum: true,
            platform: Platform::current()?,
        })
    }
}

/// Summary of a completed install or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Normalized version that was installed.
    pub version: String,
    /// Install directory.
    pub path: PathBuf,
    /// SHA-256 of the archive that was extracted.
    pub checksum: String,
    /// Archive size in bytes.
    pub archive_bytes: u64,
}

/// Drives the download core to manage one toolchain installation.
#[derive(Debug, Clone)]
pub struct Installer {
    downloader: Downloader,
    settings: InstallerSettings,
}

impl Installer {
    /// Creates an installer.
    #[must_use]
    pub fn new(downloader: Downloader, settings: InstallerSettings) -> Self {
        Self {
            downloader,
            settings,
        }
    }

    /// Returns the installer settings.
    #[must_use]
    pub fn settings(&self) -> &InstallerSettings {
        &self.settings
    }

    /// Installs `version`; refuses to overwrite an existing installation.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::AlreadyInstalled`], any download or checksum
    /// error, or an extraction/layout error.
    #[instrument(skip(self, expected_checksum))]
    pub async fn install(
        &self,
        version: &str,
        expected_checksum: Option<&str>,
    ) -> Result<InstallReport, InstallError> {
        let install_dir = &self.settings.install_dir;
        if path_exists(install_dir).await? {
            return Err(InstallError::already_installed(install_dir));
        }

        let version = normalize_version(version)?;
        let scratch = scratch_dir()?;
        let result = self
            .fetch_archive(&version, expected_checksum, scratch.path())
            .await?;
        self.place(&result.path).await?;

        info!(%version, "toolchain installed");
        Ok(self.report(version, &result))
    }

    /// Replaces the installation with `version`.
    ///
    /// The new archive is downloaded and verified before the current
    /// installation is removed; a failed download leaves it untouched.
    ///
    /// # Errors
    ///
    /// Returns any download, checksum, removal, or extraction error.
    #[instrument(skip(self, expected_checksum))]
    pub async fn update(
        &self,
        version: &str,
        expected_checksum: Option<&str>,
    ) -> Result<InstallReport, InstallError> {
        let version = normalize_version(version)?;
        let scratch = scratch_dir()?;
        let result = self
            .fetch_archive(&version, expected_checksum, scratch.path())
            .await?;

        match uninstall(&self.settings.install_dir).await? {
            UninstallOutcome::Removed => debug!("previous toolchain removed"),
            UninstallOutcome::NotInstalled => debug!("no previous toolchain"),
        }
        self.place(&result.path).await?;

        info!(%version, "toolchain updated");
        Ok(self.report(version, &result))
    }

    /// Downloads and verifies the archive for `version` into `output_dir`
    /// without installing it.
    ///
    /// # Errors
    ///
    /// Returns any download or checksum error.
    #[instrument(skip(self, expected_checksum, output_dir), fields(output = %sanitize_path(output_dir)))]
    pub async fn download(
        &self,
        version: &str,
        expected_checksum: Option<&str>,
        output_dir: &Path,
    ) -> Result<DownloadResult, InstallError> {
        let version = normalize_version(version)?;
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| InstallError::io(output_dir, e))?;
        self.fetch_archive(&version, expected_checksum, output_dir)
            .await
    }

    /// Removes the installation.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Io`] when removal fails.
    pub async fn uninstall(&self) -> Result<UninstallOutcome, InstallError> {
        uninstall(&self.settings.install_dir).await
    }

    async fn fetch_archive(
        &self,
        version: &str,
        expected_checksum: Option<&str>,
        dir: &Path,
    ) -> Result<DownloadResult, InstallError> {
        let platform = self.settings.platform;
        let url = platform.archive_url(&self.settings.base_url, version);
        let destination = dir.join(platform.archive_name(version));

        let expected = match expected_checksum {
            Some(digest) => Some(digest.to_string()),
            None if self.settings.verify_checksum => {
                let checksum_url = format!("{url}.sha256");
                debug!(url = %sanitize_url(&checksum_url), "fetching published checksum");
                Some(self.downloader.fetch_checksum(&checksum_url).await?)
            }
            None => {
                warn!("checksum verification disabled");
                None
            }
        };

        let mut request = DownloadRequest::new(url, destination);
        if let Some(digest) = expected {
            request = request.with_checksum(digest);
        }
        Ok(self.downloader.download(&request).await?)
    }

    /// Extracts `archive` next to the install directory and moves its `go/`
    /// tree into place.
    async fn place(&self, archive: &Path) -> Result<(), InstallError> {
        let install_dir = &self.settings.install_dir;
        let parent = install_dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| InstallError::io(parent, e))?;

        let staging = tempfile::Builder::new()
            .prefix(".go-installer-staging")
            .tempdir_in(parent)
            .map_err(|e| InstallError::io(parent, e))?;

        let summary =
            extract_archive_blocking(archive.to_path_buf(), staging.path().to_path_buf()).await?;
        debug!(
            extracted = summary.extracted,
            skipped = summary.skipped,
            "archive extracted"
        );

        let go_dir = staging.path().join("go");
        if !tokio::fs::metadata(&go_dir)
            .await
            .is_ok_and(|meta| meta.is_dir())
        {
            return Err(InstallError::unexpected_layout(archive));
        }

        tokio::fs::rename(&go_dir, install_dir)
            .await
            .map_err(|e| InstallError::io(install_dir, e))?;
        Ok(())
    }

    fn report(&self, version: String, result: &DownloadResult) -> InstallReport {
        InstallReport {
            version,
            path: self.settings.install_dir.clone(),
            checksum: result.final_checksum.clone(),
            archive_bytes: result.bytes_written,
        }
    }
}

fn scratch_dir() -> Result<tempfile::TempDir, InstallError> {
    tempfile::Builder::new()
        .prefix("go-installer-")
        .tempdir()
        .map_err(|e| InstallError::io(std::env::temp_dir(), e))
}

async fn path_exists(path: &Path) -> Result<bool, InstallError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| InstallError::io(path, e))
}
