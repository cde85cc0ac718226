//! `download` command handler.

use std::path::Path;

use anyhow::{Context, Result};

use super::CommandContext;
use crate::cli::VersionArgs;

pub async fn run_download_command(
    ctx: &CommandContext,
    args: &VersionArgs,
    output: &Path,
) -> Result<()> {
    let installer = ctx.installer()?;
    let result = installer
        .download(&args.version, args.sha256.as_deref(), output)
        .await
        .with_context(|| format!("Failed to download Go {}", args.version))?;

    println!(
        "Downloaded {} ({} bytes, sha256 {})",
        result.path.display(),
        result.bytes_written,
        result.final_checksum
    );
    Ok(())
}
