//! Extraction of `.tar.gz` and `.zip` toolchain archives.
//!
//! Entries whose path is absolute or climbs out of the destination are
//! skipped with a warning rather than failing the whole extraction.

use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, warn};
use zip::result::ZipError;

use super::error::InstallError;
use super::platform::ArchiveKind;
use crate::download::sanitize_path;

/// Counts from one extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Entries written to disk.
    pub extracted: usize,
    /// Entries refused because they would escape the destination.
    pub skipped: usize,
}

/// Extracts `archive_path` into `dest_dir`, picking the format from the
/// file name.
///
/// # Errors
///
/// Returns [`InstallError::Extraction`] for unknown formats or corrupt
/// archives, [`InstallError::Io`] for filesystem failures.
pub fn extract_archive(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<ExtractionSummary, InstallError> {
    let name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match ArchiveKind::from_file_name(&name) {
        Some(ArchiveKind::TarGz) => extract_tar_gz(archive_path, dest_dir),
        Some(ArchiveKind::Zip) => extract_zip(archive_path, dest_dir),
        None => Err(InstallError::extraction(
            archive_path,
            "unrecognized archive format",
        )),
    }
}

/// Runs [`extract_archive`] on the blocking thread pool.
///
/// # Errors
///
/// Same as [`extract_archive`]; a panicked or cancelled worker is reported
/// as [`InstallError::Extraction`].
pub async fn extract_archive_blocking(
    archive_path: PathBuf,
    dest_dir: PathBuf,
) -> Result<ExtractionSummary, InstallError> {
    let label = archive_path.clone();
    tokio::task::spawn_blocking(move || extract_archive(&archive_path, &dest_dir))
        .await
        .map_err(|e| InstallError::extraction(&label, format!("extraction task failed: {e}")))?
}

/// Extracts a gzip-compressed tarball.
///
/// # Errors
///
/// Returns [`InstallError::Extraction`] for corrupt archives or entries that
/// cannot be unpacked.
pub fn extract_tar_gz(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<ExtractionSummary, InstallError> {
    std::fs::create_dir_all(dest_dir).map_err(|e| InstallError::io(dest_dir, e))?;

    let file = File::open(archive_path).map_err(|e| InstallError::io(archive_path, e))?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    archive.set_preserve_permissions(true);

    let mut summary = ExtractionSummary::default();
    let entries = archive
        .entries()
        .map_err(|e| InstallError::extraction(archive_path, corrupt_tar(&e)))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| InstallError::extraction(archive_path, corrupt_tar(&e)))?;
        let entry_path = entry
            .path()
            .map_err(|e| InstallError::extraction(archive_path, corrupt_tar(&e)))?
            .into_owned();

        if !is_enclosed(&entry_path) {
            warn!(entry = %entry_path.display(), "skipping archive entry outside destination");
            summary.skipped += 1;
            continue;
        }

        let unpacked = entry.unpack_in(dest_dir).map_err(|e| {
            InstallError::extraction(
                archive_path,
                format!("cannot unpack {}: {}", sanitize_path(&entry_path), e.kind()),
            )
        })?;
        if unpacked {
            summary.extracted += 1;
        } else {
            warn!(entry = %entry_path.display(), "skipping archive entry outside destination");
            summary.skipped += 1;
        }
    }

    debug!(
        extracted = summary.extracted,
        skipped = summary.skipped,
        "tar.gz extracted"
    );
    Ok(summary)
}

/// Extracts a zip archive, preserving Unix permissions when recorded.
///
/// # Errors
///
/// Returns [`InstallError::Extraction`] for corrupt archives,
/// [`InstallError::Io`] for filesystem failures.
pub fn extract_zip(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<ExtractionSummary, InstallError> {
    std::fs::create_dir_all(dest_dir).map_err(|e| InstallError::io(dest_dir, e))?;

    let file = File::open(archive_path).map_err(|e| InstallError::io(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| InstallError::extraction(archive_path, corrupt_zip(&e)))?;

    let mut summary = ExtractionSummary::default();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| InstallError::extraction(archive_path, corrupt_zip(&e)))?;

        let Some(relative) = entry.enclosed_name().filter(|p| is_enclosed(p)) else {
            warn!(entry = %entry.name(), "skipping archive entry outside destination");
            summary.skipped += 1;
            continue;
        };
        let output_path = dest_dir.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&output_path)
                .map_err(|e| InstallError::io(&output_path, e))?;
        } else {
            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| InstallError::io(parent, e))?;
            }
            let mut outfile =
                File::create(&output_path).map_err(|e| InstallError::io(&output_path, e))?;
            std::io::copy(&mut entry, &mut outfile)
                .map_err(|e| InstallError::io(&output_path, e))?;
        }

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&output_path, std::fs::Permissions::from_mode(mode))
                .map_err(|e| InstallError::io(&output_path, e))?;
        }

        summary.extracted += 1;
    }

    debug!(
        extracted = summary.extracted,
        skipped = summary.skipped,
        "zip extracted"
    );
    Ok(summary)
}

// The tar and zip crates embed absolute destination paths in their error
// text, so messages are rebuilt from the error kind alone.
fn corrupt_tar(error: &std::io::Error) -> String {
    format!("corrupt tar stream: {}", error.kind())
}

fn corrupt_zip(error: &ZipError) -> String {
    match error {
        ZipError::Io(io) => format!("cannot read zip archive: {}", io.kind()),
        ZipError::InvalidArchive(_) => "invalid zip archive".to_string(),
        ZipError::UnsupportedArchive(_) => "unsupported zip archive".to_string(),
        _ => "unreadable zip archive".to_string(),
    }
}

/// True when `path` is relative and never climbs above its root.
fn is_enclosed(path: &Path) -> bool {
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}
