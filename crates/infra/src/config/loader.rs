//! Configuration loader
//!
//! Loads engine configuration from environment variables or a TOML file.
//!
//! ## Loading Strategy
//! 1. `.env` is read into the process environment if present
//! 2. Environment variables win when the required ones are set
//! 3. Otherwise a config file is probed at `./keystay.toml`, `./config.toml`,
//!    and the parent-directory equivalents
//! 4. Anything still unset falls back to defaults
//!
//! ## Environment Variables
//! - `KEYSTAY_DB_PATH`: Database file path (required for env loading)
//! - `KEYSTAY_DB_POOL_SIZE`: Connection pool size
//! - `KEYSTAY_SYNC_ENABLED`: Whether scheduled syncing is enabled
//! - `KEYSTAY_SYNC_INTERVAL`: Seconds between sync cycles
//! - `KEYSTAY_FEED_PAUSE_MS`: Milliseconds between feeds inside a cycle
//! - `KEYSTAY_FETCH_TIMEOUT`: Feed fetch timeout in seconds
//! - `KEYSTAY_EXPORT_HORIZON_DAYS`: Export lookahead in days

use std::path::{Path, PathBuf};

use keystay_domain::{Config, KeystayError, Result};
use tracing::{debug, info};

/// Load configuration with automatic fallback strategy.
///
/// # Errors
/// Returns `KeystayError::Config` if neither the environment nor any probed
/// file yields a usable configuration.
pub fn load() -> Result<Config> {
    dotenvy::dotenv().ok();

    match load_from_env() {
        Ok(config) => {
            info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            debug!(error = ?e, "environment incomplete, probing config files");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables.
///
/// `KEYSTAY_DB_PATH` is required; everything else defaults.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.database.path = required_var("KEYSTAY_DB_PATH")?;
    if let Some(value) = optional_var("KEYSTAY_DB_POOL_SIZE") {
        config.database.pool_size = parse_var("KEYSTAY_DB_POOL_SIZE", &value)?;
    }
    if let Some(value) = optional_var("KEYSTAY_SYNC_ENABLED") {
        config.sync.enabled = parse_bool("KEYSTAY_SYNC_ENABLED", &value)?;
    }
    if let Some(value) = optional_var("KEYSTAY_SYNC_INTERVAL") {
        config.sync.interval_secs = parse_var("KEYSTAY_SYNC_INTERVAL", &value)?;
    }
    if let Some(value) = optional_var("KEYSTAY_FEED_PAUSE_MS") {
        config.sync.feed_pause_ms = parse_var("KEYSTAY_FEED_PAUSE_MS", &value)?;
    }
    if let Some(value) = optional_var("KEYSTAY_FETCH_TIMEOUT") {
        config.sync.fetch_timeout_secs = parse_var("KEYSTAY_FETCH_TIMEOUT", &value)?;
    }
    if let Some(value) = optional_var("KEYSTAY_EXPORT_HORIZON_DAYS") {
        config.export.horizon_days = parse_var("KEYSTAY_EXPORT_HORIZON_DAYS", &value)?;
    }

    Ok(config)
}

/// Load configuration from a TOML file.
///
/// With `None`, the standard locations are probed in order.
pub fn load_from_file(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => probe_config_paths().ok_or_else(|| {
            KeystayError::Config("no configuration file found in standard locations".into())
        })?,
    };

    let raw = std::fs::read_to_string(&path).map_err(|e| {
        KeystayError::Config(format!("failed to read {}: {e}", path.display()))
    })?;

    let config: Config = toml::from_str(&raw).map_err(|e| {
        KeystayError::Config(format!("failed to parse {}: {e}", path.display()))
    })?;

    info!(path = %path.display(), "configuration loaded from file");
    Ok(config)
}

fn probe_config_paths() -> Option<PathBuf> {
    const CANDIDATES: [&str; 4] =
        ["keystay.toml", "config.toml", "../keystay.toml", "../config.toml"];

    CANDIDATES.iter().map(PathBuf::from).find(|p| p.is_file())
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| KeystayError::Config(format!("missing environment variable {name}")))
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| KeystayError::Config(format!("invalid value for {name}: {e}")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(KeystayError::Config(format!("invalid boolean for {name}: {other}"))),
    }
}
