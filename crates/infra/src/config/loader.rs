//! Configuration loader
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `ROLLCALL_API_BASE_URL` is unset, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Every field other than the base URL has a default, so a file may be as
//! small as `[api]\nbase_url = "https://..."`.
//!
//! ## Environment Variables
//! - `ROLLCALL_API_BASE_URL`: Backend base URL (required)
//! - `ROLLCALL_API_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `ROLLCALL_REFRESH_TIMEOUT_SECS`: Upper bound on a token refresh
//! - `ROLLCALL_KEYCHAIN_SERVICE`: Keychain service the tokens live under
//! - `ROLLCALL_MIN_PASSWORD_LENGTH`: Minimum password length at signup
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./rollcall.json` or `./rollcall.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use rollcall_domain::{Config, Result, RollcallError};
use url::Url;

use crate::errors::InfraError;

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `RollcallError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The base URL is not an http(s) URL
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only the base URL is required; unset optional variables keep their
/// defaults.
///
/// # Errors
/// Returns `RollcallError::Config` if the base URL is missing or any
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    config.api.base_url = env_var("ROLLCALL_API_BASE_URL")?;

    if let Some(secs) = env_parse::<u64>("ROLLCALL_API_TIMEOUT_SECS")? {
        config.api.timeout_secs = secs;
    }
    if let Some(secs) = env_parse::<u64>("ROLLCALL_REFRESH_TIMEOUT_SECS")? {
        config.auth.refresh_timeout_secs = secs;
    }
    if let Some(len) = env_parse::<usize>("ROLLCALL_MIN_PASSWORD_LENGTH")? {
        config.auth.min_password_length = len;
    }
    if let Ok(service) = std::env::var("ROLLCALL_KEYCHAIN_SERVICE") {
        config.keychain.service_name = service;
    }

    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `RollcallError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(RollcallError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            RollcallError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| RollcallError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    validate(&config)?;
    Ok(config)
}

/// Check the settings that would otherwise only fail at the first request.
///
/// # Errors
/// Returns `RollcallError::Config` for a non-http(s) base URL or a zero
/// timeout.
pub fn validate(config: &Config) -> Result<()> {
    let base = Url::parse(&config.api.base_url).map_err(InfraError::from)?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(RollcallError::Config(format!(
            "Unsupported base URL scheme: {}",
            base.scheme()
        )));
    }
    if config.api.timeout_secs == 0 || config.auth.refresh_timeout_secs == 0 {
        return Err(RollcallError::Config("Timeouts must be at least one second".to_string()));
    }
    Ok(())
}

/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let config = match extension {
        "toml" => toml::from_str(contents).map_err(InfraError::from)?,
        "json" => serde_json::from_str(contents).map_err(InfraError::from)?,
        _ => {
            return Err(RollcallError::Config(format!(
                "Unsupported config format: {}",
                extension
            )))
        }
    };
    Ok(config)
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("rollcall.json"),
        dir.join("rollcall.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        RollcallError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// `Ok(None)` when the variable is unset.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| RollcallError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}
