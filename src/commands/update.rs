//! `update` command handler.

use anyhow::{Context, Result};
use go_installer::install::{Elevation, elevate_and_execute};

use super::CommandContext;
use crate::cli::VersionArgs;

pub async fn run_update_command(ctx: &CommandContext, args: &VersionArgs) -> Result<()> {
    let installer = ctx.installer()?;
    let install_dir = ctx.config.install_dir.clone();

    let outcome = elevate_and_execute(&install_dir, ctx.elevated, || {
        installer.update(&args.version, args.sha256.as_deref())
    })
    .await
    .with_context(|| format!("Failed to update to Go {}", args.version))?;

    if let Elevation::InProcess(report) = outcome {
        println!(
            "Updated {} to Go {} (sha256 {})",
            report.path.display(),
            report.version,
            report.checksum
        );
    }
    Ok(())
}
