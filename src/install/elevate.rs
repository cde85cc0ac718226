//! Privilege elevation for writes to system directories.
//!
//! When the install location is not writable by the current user, the whole
//! command is re-run through `sudo` (Unix) or an elevated PowerShell
//! `Start-Process` (Windows) with the hidden `--elevated` flag appended.

use std::ffi::OsString;
use std::future::Future;
use std::path::Path;

use tracing::{debug, info, instrument};

use super::error::InstallError;
use crate::download::sanitize_path;

/// Flag appended to the re-executed command line.
pub const ELEVATED_FLAG: &str = "--elevated";

/// Where the operation ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Elevation<T> {
    /// The operation ran in this process and produced `T`.
    InProcess(T),
    /// An elevated child process ran the command and exited successfully.
    Delegated,
}

/// Runs `op` in-process when `target` can be written, otherwise re-runs the
/// current command with elevated privileges.
///
/// When `already_elevated` is set, `op` always runs in-process so a child
/// that still lacks permissions fails instead of looping.
///
/// # Errors
///
/// Returns the error of `op`, or [`InstallError::Elevation`] when the
/// elevated child cannot be started or exits unsuccessfully.
#[instrument(skip(target, op), fields(target = %sanitize_path(target)))]
pub async fn elevate_and_execute<T, F, Fut>(
    target: &Path,
    already_elevated: bool,
    op: F,
) -> Result<Elevation<T>, InstallError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, InstallError>>,
{
    if already_elevated || is_writable(target) {
        debug!(already_elevated, "running in-process");
        return op().await.map(Elevation::InProcess);
    }

    info!("install location is not writable; requesting elevated privileges");
    let exe = std::env::current_exe().map_err(|e| InstallError::Elevation {
        message: format!("cannot locate current executable: {e}"),
    })?;
    let mut args: Vec<OsString> = std::env::args_os().skip(1).collect();
    args.push(OsString::from(ELEVATED_FLAG));

    run_elevated(&exe, &args).await?;
    Ok(Elevation::Delegated)
}

/// True when the current user can replace `target`.
///
/// Removing or renaming `target` needs write access to the directory that
/// holds it, so the nearest existing ancestor of its parent is probed, and
/// `target` itself as well when it is an existing directory.
#[must_use]
pub fn is_writable(target: &Path) -> bool {
    let container = target.parent().filter(|p| !p.as_os_str().is_empty());
    let Some(holder) = nearest_existing_dir(container.unwrap_or(target)) else {
        return false;
    };
    if !can_create_file_in(&holder) {
        return false;
    }
    !target.is_dir() || can_create_file_in(target)
}

fn can_create_file_in(dir: &Path) -> bool {
    let writable = tempfile::Builder::new()
        .prefix(".go-installer-probe")
        .tempfile_in(dir)
        .is_ok();
    debug!(dir = %sanitize_path(dir), writable, "write probe");
    writable
}

fn nearest_existing_dir(target: &Path) -> Option<std::path::PathBuf> {
    target
        .ancestors()
        .find(|candidate| !candidate.as_os_str().is_empty() && candidate.is_dir())
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())
}

#[cfg(not(windows))]
async fn run_elevated(exe: &Path, args: &[OsString]) -> Result<(), InstallError> {
    let status = tokio::process::Command::new("sudo")
        .arg("--")
        .arg(exe)
        .args(args)
        .status()
        .await
        .map_err(|e| InstallError::Elevation {
            message: format!("failed to start sudo: {e}"),
        })?;
    check_status(status)
}

#[cfg(windows)]
async fn run_elevated(exe: &Path, args: &[OsString]) -> Result<(), InstallError> {
    let argument_list = args
        .iter()
        .map(|arg| powershell_quote(&arg.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(",");
    let script = format!(
        "$p = Start-Process -FilePath {} -ArgumentList {} -Verb RunAs -Wait -PassThru; exit $p.ExitCode",
        powershell_quote(&exe.to_string_lossy()),
        argument_list
    );
    let status = tokio::process::Command::new("powershell")
        .args(["-NoProfile", "-NonInteractive", "-Command", &script])
        .status()
        .await
        .map_err(|e| InstallError::Elevation {
            message: format!("failed to start powershell: {e}"),
        })?;
    check_status(status)
}

fn check_status(status: std::process::ExitStatus) -> Result<(), InstallError> {
    if status.success() {
        Ok(())
    } else {
        Err(InstallError::Elevation {
            message: match status.code() {
                Some(code) => format!("exited with status {code}"),
                None => "terminated by signal".to_string(),
            },
        })
    }
}

/// Single-quotes `value` for PowerShell, doubling embedded quotes.
#[cfg_attr(not(windows), allow(dead_code))]
fn powershell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
