//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Download, install, update, and uninstall the Go toolchain.
#[derive(Parser, Debug)]
#[command(name = "go-installer")]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted before or after any subcommand.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Toolchain install directory [default: /usr/local/go]
    #[arg(long, global = true, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// Archive host prefix [default: https://dl.google.com/go]
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Maximum retry attempts for transient failures (0-10)
    #[arg(short = 'r', long, global = true, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: Option<u8>,

    /// Set on the re-executed command after privilege elevation
    #[arg(long, global = true, hide = true)]
    pub elevated: bool,
}

/// Toolchain operations.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Install a Go version (fails if one is already installed)
    Install(VersionArgs),

    /// Replace the installed Go version
    Update(VersionArgs),

    /// Remove the installed Go toolchain
    Uninstall,

    /// Download and verify an archive without installing it
    Download {
        #[command(flatten)]
        version: VersionArgs,

        /// Directory to write the archive into
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,
    },
}

/// Version selection shared by install, update, and download.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct VersionArgs {
    /// Go version, e.g. 1.22.3 (a leading "go" or "v" is accepted)
    pub version: String,

    /// Expected SHA-256 of the archive; overrides the published checksum
    #[arg(long, value_name = "HEX")]
    pub sha256: Option<String>,
}
