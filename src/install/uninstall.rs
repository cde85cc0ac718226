//! Removal of an installed toolchain.

use std::path::Path;

use tracing::{info, instrument};

use super::error::InstallError;
use crate::download::sanitize_path;

/// What [`uninstall`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallOutcome {
    /// Nothing existed at the install directory.
    NotInstalled,
    /// The install directory was removed.
    Removed,
}

/// Removes the toolchain at `install_dir`.
///
/// A missing directory is reported as [`UninstallOutcome::NotInstalled`],
/// not as an error.
///
/// # Errors
///
/// Returns [`InstallError::Io`] when the directory exists but cannot be
/// inspected or removed.
#[instrument(skip(install_dir), fields(dir = %sanitize_path(install_dir)))]
pub async fn uninstall(install_dir: &Path) -> Result<UninstallOutcome, InstallError> {
    match tokio::fs::metadata(install_dir).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("no toolchain installed");
            return Ok(UninstallOutcome::NotInstalled);
        }
        Err(e) => return Err(InstallError::io(install_dir, e)),
    }

    tokio::fs::remove_dir_all(install_dir)
        .await
        .map_err(|e| InstallError::io(install_dir, e))?;
    info!("toolchain removed");
    Ok(UninstallOutcome::Removed)
}
