//! CLI command handlers.

mod download;
mod install;
mod uninstall;
mod update;

use std::io::IsTerminal;

use anyhow::{Context, Result};
use go_installer::download::{Downloader, byte_progress_bar};
use go_installer::install::{Installer, InstallerSettings, Platform};

use crate::config::EffectiveConfig;

pub use download::run_download_command;
pub use install::run_install_command;
pub use uninstall::run_uninstall_command;
pub use update::run_update_command;

/// Shared inputs for every command handler.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: EffectiveConfig,
    pub quiet: bool,
    pub elevated: bool,
}

impl CommandContext {
    /// Builds an installer for the host platform from the effective config.
    pub fn installer(&self) -> Result<Installer> {
        let platform = Platform::current()?;
        let mut downloader = Downloader::new(self.config.downloader_settings())
            .context("Failed to build HTTP client")?;
        if !self.quiet && std::io::stderr().is_terminal() {
            downloader = downloader.with_progress(byte_progress_bar());
        }

        Ok(Installer::new(
            downloader,
            InstallerSettings {
                install_dir: self.config.install_dir.clone(),
                base_url: self.config.base_url.clone(),
                verify_checksum: self.config.verify_checksum,
                platform,
            },
        ))
    }
}
