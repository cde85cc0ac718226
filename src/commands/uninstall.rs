//! `uninstall` command handler.

use anyhow::{Context, Result};
use go_installer::install::{Elevation, UninstallOutcome, elevate_and_execute, uninstall};

use super::CommandContext;

pub async fn run_uninstall_command(ctx: &CommandContext) -> Result<()> {
    let install_dir = ctx.config.install_dir.clone();

    if !tokio::fs::try_exists(&install_dir).await.unwrap_or(false) {
        println!("Go is not installed at {}", install_dir.display());
        return Ok(());
    }

    let outcome = elevate_and_execute(&install_dir, ctx.elevated, || uninstall(&install_dir))
        .await
        .context("Failed to uninstall Go")?;

    match outcome {
        Elevation::InProcess(UninstallOutcome::Removed) => {
            println!("Removed Go from {}", install_dir.display());
        }
        Elevation::InProcess(UninstallOutcome::NotInstalled) => {
            println!("Go is not installed at {}", install_dir.display());
        }
        Elevation::Delegated => {}
    }
    Ok(())
}
