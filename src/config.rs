//! File configuration for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use go_installer::download::{
    Backoff, ClientTimeouts, DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, DownloaderSettings,
    RetryPolicy,
};
use go_installer::install::{DEFAULT_BASE_URL, default_install_dir};
use serde::Deserialize;

use crate::cli::GlobalArgs;

const APP_DIR: &str = "go-installer";

/// Backoff curve names accepted in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffSetting {
    Linear,
    Exponential,
}

/// TOML-backed file configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Toolchain install directory.
    pub install_dir: Option<PathBuf>,
    /// Archive host prefix.
    pub base_url: Option<String>,
    /// Retries after the first attempt (0..=10).
    pub max_retries: Option<u32>,
    /// Base backoff delay in milliseconds (0..=60000).
    pub retry_base_delay_ms: Option<u64>,
    /// Backoff curve.
    pub backoff: Option<BackoffSetting>,
    /// HTTP connect timeout in seconds (1..=3600).
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds (1..=3600).
    pub read_timeout_secs: Option<u64>,
    /// Fetch the published `.sha256` when no digest is given.
    pub verify_checksum: Option<bool>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(max_retries) = self.max_retries
            && max_retries > 10
        {
            bail!("Invalid config value for `max_retries`: {max_retries}. Expected range: 0..=10");
        }

        if let Some(delay) = self.retry_base_delay_ms
            && delay > 60_000
        {
            bail!(
                "Invalid config value for `retry_base_delay_ms`: {delay}. Expected range: 0..=60000"
            );
        }

        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;

        if let Some(base_url) = &self.base_url
            && base_url.trim().is_empty()
        {
            bail!("Invalid config value for `base_url`: must not be empty");
        }

        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/go-installer/config.toml`
/// 2. `$HOME/.config/go-installer/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let cfg: FileConfig = toml::from_str(raw)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Effective settings after merging CLI flags, file config, and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub install_dir: PathBuf,
    pub base_url: String,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub backoff: Backoff,
    pub timeouts: ClientTimeouts,
    pub verify_checksum: bool,
}

impl EffectiveConfig {
    /// Merges with precedence: CLI flag > config file > built-in default.
    #[must_use]
    pub fn resolve(args: &GlobalArgs, file: Option<&FileConfig>) -> Self {
        let file = file.cloned().unwrap_or_default();
        let defaults = ClientTimeouts::default();

        let backoff = match file.backoff {
            Some(BackoffSetting::Exponential) => Backoff::Exponential { multiplier: 2.0 },
            Some(BackoffSetting::Linear) | None => Backoff::Linear,
        };

        Self {
            install_dir: args
                .install_dir
                .clone()
                .or(file.install_dir)
                .unwrap_or_else(default_install_dir),
            base_url: args
                .base_url
                .clone()
                .or(file.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_retries: args
                .max_retries
                .map(u32::from)
                .or(file.max_retries)
                .unwrap_or(DEFAULT_MAX_RETRIES),
            retry_base_delay: file
                .retry_base_delay_ms
                .map_or(DEFAULT_BASE_DELAY, Duration::from_millis),
            backoff,
            timeouts: ClientTimeouts {
                connect_secs: file.connect_timeout_secs.unwrap_or(defaults.connect_secs),
                read_secs: file.read_timeout_secs.unwrap_or(defaults.read_secs),
            },
            verify_checksum: file.verify_checksum.unwrap_or(true),
        }
    }

    /// Settings handed to the downloader.
    #[must_use]
    pub fn downloader_settings(&self) -> DownloaderSettings {
        DownloaderSettings {
            timeouts: self.timeouts,
            retry_policy: RetryPolicy::new(self.max_retries, self.retry_base_delay, self.backoff),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn no_flags() -> GlobalArgs {
        GlobalArgs {
            verbose: 0,
            quiet: false,
            install_dir: None,
            base_url: None,
            max_retries: None,
            elevated: false,
        }
    }

    #[test]
    fn test_parse_config_full() {
        let cfg = parse_config_str(
            r#"
install_dir = "/opt/go"
base_url = "https://mirror.example.com/golang"
max_retries = 5
retry_base_delay_ms = 500
backoff = "exponential"
connect_timeout_secs = 10
read_timeout_secs = 600
verify_checksum = false
"#,
        )
        .unwrap();
        assert_eq!(cfg.install_dir, Some(PathBuf::from("/opt/go")));
        assert_eq!(cfg.max_retries, Some(5));
        assert_eq!(cfg.backoff, Some(BackoffSetting::Exponential));
        assert_eq!(cfg.verify_checksum, Some(false));
    }

    #[test]
    fn test_parse_config_empty_is_default() {
        assert_eq!(parse_config_str("").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_parse_config_rejects_unknown_key() {
        let err = parse_config_str("concurrency = 4").unwrap_err();
        assert!(format!("{err:#}").contains("concurrency"), "{err:#}");
    }

    #[test]
    fn test_parse_config_rejects_out_of_range_values() {
        let err = parse_config_str("max_retries = 11").unwrap_err();
        assert!(err.to_string().contains("max_retries"));

        let err = parse_config_str("retry_base_delay_ms = 60001").unwrap_err();
        assert!(err.to_string().contains("retry_base_delay_ms"));

        let err = parse_config_str("connect_timeout_secs = 0").unwrap_err();
        assert!(err.to_string().contains("connect_timeout_secs"));

        let err = parse_config_str("read_timeout_secs = 3601").unwrap_err();
        assert!(err.to_string().contains("read_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_backoff() {
        assert!(parse_config_str(r#"backoff = "fibonacci""#).is_err());
    }

    #[test]
    fn test_resolve_defaults() {
        let effective = EffectiveConfig::resolve(&no_flags(), None);
        assert_eq!(effective.install_dir, default_install_dir());
        assert_eq!(effective.base_url, "https://dl.google.com/go");
        assert_eq!(effective.max_retries, 3);
        assert_eq!(effective.retry_base_delay, Duration::from_secs(2));
        assert_eq!(effective.backoff, Backoff::Linear);
        assert_eq!(effective.timeouts, ClientTimeouts::default());
        assert!(effective.verify_checksum);
    }

    #[test]
    fn test_resolve_cli_overrides_file() {
        let file = FileConfig {
            install_dir: Some(PathBuf::from("/from/file")),
            max_retries: Some(7),
            base_url: Some("https://file.example.com/go".to_string()),
            ..FileConfig::default()
        };
        let mut args = no_flags();
        args.install_dir = Some(PathBuf::from("/from/cli"));
        args.max_retries = Some(1);

        let effective = EffectiveConfig::resolve(&args, Some(&file));
        assert_eq!(effective.install_dir, PathBuf::from("/from/cli"));
        assert_eq!(effective.max_retries, 1);
        assert_eq!(effective.base_url, "https://file.example.com/go");
    }

    #[test]
    fn test_downloader_settings_carry_retry_values() {
        let file = FileConfig {
            max_retries: Some(2),
            retry_base_delay_ms: Some(100),
            connect_timeout_secs: Some(5),
            ..FileConfig::default()
        };
        let settings = EffectiveConfig::resolve(&no_flags(), Some(&file)).downloader_settings();
        assert_eq!(settings.retry_policy.max_retries(), 2);
        assert_eq!(settings.retry_policy.base_delay(), Duration::from_millis(100));
        assert_eq!(settings.timeouts.connect_secs, 5);
    }
}
