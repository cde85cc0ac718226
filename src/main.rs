//! CLI entry point for go-installer.

use anyhow::Result;
use clap::Parser;
use go_installer::download::{sanitize_path, sanitize_url};
use tracing::{debug, info};

mod cli;
mod commands;
mod config;

use cli::{Cli, Command};
use commands::CommandContext;
use config::{EffectiveConfig, load_default_file_config};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if cli.global.quiet {
        "error"
    } else {
        match cli.global.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(
        verbose = cli.global.verbose,
        quiet = cli.global.quiet,
        elevated = cli.global.elevated,
        "CLI arguments parsed"
    );

    let loaded = load_default_file_config()?;
    debug!(
        config_path = %loaded.path.as_deref().map_or_else(|| "none".to_string(), sanitize_path),
        loaded = loaded.config.is_some(),
        "file config resolved"
    );

    let ctx = CommandContext {
        config: EffectiveConfig::resolve(&cli.global, loaded.config.as_ref()),
        quiet: cli.global.quiet,
        elevated: cli.global.elevated,
    };
    info!(
        install_dir = %sanitize_path(&ctx.config.install_dir),
        base_url = %sanitize_url(&ctx.config.base_url),
        max_retries = ctx.config.max_retries,
        "go-installer starting"
    );

    match &cli.command {
        Command::Install(args) => commands::run_install_command(&ctx, args).await,
        Command::Update(args) => commands::run_update_command(&ctx, args).await,
        Command::Uninstall => commands::run_uninstall_command(&ctx).await,
        Command::Download { version, output } => {
            commands::run_download_command(&ctx, version, output).await
        }
    }
}
