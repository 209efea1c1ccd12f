//! Pool configuration for the SQLite backend.

use std::time::Duration;

/// Configuration for [`crate::storage::SqlitePool`].
#[derive(Debug, Clone)]
pub struct SqlitePoolConfig {
    /// Maximum number of pooled connections.
    pub max_size: u32,
    /// How long to wait for a free connection before failing.
    pub connection_timeout: Duration,
    /// SQLite busy timeout applied to each connection.
    pub busy_timeout: Duration,
    /// Enable WAL journal mode (recommended; readers don't block the writer).
    pub wal: bool,
    /// Enforce foreign key constraints on every connection.
    pub foreign_keys: bool,
}

impl Default for SqlitePoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            wal: true,
            foreign_keys: true,
        }
    }
}
