//! Engine configuration structures.
//!
//! Populated by the infra config loader from a TOML file and/or `KEYSTAY_*`
//! environment variables.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub export: ExportConfig,
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: String,
    /// Connection pool size.
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "keystay.db".into(), pool_size: 10 }
    }
}

/// External feed synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Whether scheduled syncing is enabled at all.
    pub enabled: bool,
    /// Seconds between sync cycles per property.
    pub interval_secs: u64,
    /// Milliseconds to pause between feeds inside one cycle.
    pub feed_pause_ms: u64,
    /// Timeout for one feed fetch, in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: constants::SYNC_INTERVAL_SECS,
            feed_pause_ms: constants::FEED_PAUSE_MS,
            fetch_timeout_secs: constants::FEED_FETCH_TIMEOUT_SECS,
        }
    }
}

/// Calendar export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// How many days ahead the export includes.
    pub horizon_days: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { horizon_days: constants::EXPORT_HORIZON_DAYS }
    }
}
