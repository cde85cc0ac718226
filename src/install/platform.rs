//! Host platform detection and Go release naming.
//!
//! Go publishes archives as `go<version>.<os>-<arch>.<ext>`, e.g.
//! `go1.22.3.linux-amd64.tar.gz` or `go1.22.3.windows-amd64.zip`.

use std::fmt;

use super::error::InstallError;

/// Archive container used for a platform's release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Gzip-compressed tarball.
    TarGz,
    /// Zip archive (Windows releases).
    Zip,
}

impl ArchiveKind {
    /// File extension without a leading dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }

    /// Guesses the container from a file name.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// An OS/architecture pair in Go's naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    os: &'static str,
    arch: &'static str,
}

impl Platform {
    /// Builds a platform from Rust's `std::env::consts` names.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::UnsupportedPlatform`] when Go publishes no
    /// release for the pair's OS or architecture.
    pub fn from_rust_names(os: &str, arch: &str) -> Result<Self, InstallError> {
        let go_os = match os {
            "linux" => Some("linux"),
            "macos" => Some("darwin"),
            "windows" => Some("windows"),
            "freebsd" => Some("freebsd"),
            _ => None,
        };
        let go_arch = match arch {
            "x86_64" => Some("amd64"),
            "aarch64" => Some("arm64"),
            "x86" => Some("386"),
            "arm" => Some("armv6l"),
            "riscv64" => Some("riscv64"),
            "powerpc64" => Some("ppc64le"),
            "s390x" => Some("s390x"),
            "loongarch64" => Some("loong64"),
            _ => None,
        };

        match (go_os, go_arch) {
            (Some(os), Some(arch)) => Ok(Self { os, arch }),
            _ => Err(InstallError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            }),
        }
    }

    /// Detects the host platform.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::UnsupportedPlatform`] on hosts without a Go
    /// release.
    pub fn current() -> Result<Self, InstallError> {
        Self::from_rust_names(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Go OS name (`linux`, `darwin`, ...).
    #[must_use]
    pub fn os(self) -> &'static str {
        self.os
    }

    /// Go architecture name (`amd64`, `arm64`, ...).
    #[must_use]
    pub fn arch(self) -> &'static str {
        self.arch
    }

    /// Archive container published for this platform.
    #[must_use]
    pub fn archive_kind(self) -> ArchiveKind {
        if self.os == "windows" {
            ArchiveKind::Zip
        } else {
            ArchiveKind::TarGz
        }
    }

    /// Archive file name for `version` (already normalized).
    #[must_use]
    pub fn archive_name(self, version: &str) -> String {
        format!(
            "go{version}.{}-{}.{}",
            self.os,
            self.arch,
            self.archive_kind().extension()
        )
    }

    /// Download URL of the archive for `version` under `base_url`.
    #[must_use]
    pub fn archive_url(self, base_url: &str, version: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.archive_name(version)
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Strips a leading `go` or `v` and checks the remaining characters.
///
/// # Errors
///
/// Returns [`InstallError::InvalidVersion`] for empty versions or versions
/// with characters other than ASCII alphanumerics and `.`.
///
/// # Examples
///
/// ```
/// use go_installer::install::normalize_version;
///
/// assert_eq!(normalize_version("go1.22.3").unwrap(), "1.22.3");
/// assert_eq!(normalize_version("v1.21rc2").unwrap(), "1.21rc2");
/// assert!(normalize_version("1.22/../x").is_err());
/// ```
pub fn normalize_version(raw: &str) -> Result<String, InstallError> {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_prefix("go")
        .or_else(|| trimmed.strip_prefix('v'))
        .unwrap_or(trimmed);

    let valid = !stripped.is_empty()
        && stripped.starts_with(|c: char| c.is_ascii_digit())
        && stripped
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.');

    if valid {
        Ok(stripped.to_string())
    } else {
        Err(InstallError::InvalidVersion {
            version: raw.to_string(),
        })
    }
}
