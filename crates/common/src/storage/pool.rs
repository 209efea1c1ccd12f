//! SQLite connection pool.
//!
//! r2d2-backed pool where every connection gets the standard pragmas applied
//! on checkout initialization.

use std::path::Path;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, info, warn};

use super::config::SqlitePoolConfig;
use super::connection::StoreConnection;
use super::error::{StorageError, StorageResult};
use super::metrics::StorageMetrics;
use super::pragmas::apply_connection_pragmas;

/// SQLite connection pool.
///
/// Manages a pool of SQLite connections using r2d2, with WAL mode and
/// busy-timeout pragmas applied per connection.
#[derive(Debug)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    config: SqlitePoolConfig,
    metrics: Arc<StorageMetrics>,
}

impl SqlitePool {
    /// Create a new pool for the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database file can't be opened or the pool
    /// can't be built (e.g. the path is a directory).
    pub fn new(path: &Path, config: SqlitePoolConfig) -> StorageResult<Self> {
        info!(db_path = %path.display(), pool_size = config.max_size, "creating sqlite pool");

        let metrics = Arc::new(StorageMetrics::new(config.max_size));

        let pool_config = config.clone();
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            apply_connection_pragmas(conn, &pool_config)
        });

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| {
                warn!("failed to create connection pool: {e}");
                StorageError::Connection(format!("failed to create pool: {e}"))
            })?;

        // Check out one connection so a bad path fails at startup, not at
        // first query.
        pool.get()
            .map_err(|e| StorageError::Connection(format!("failed to get test connection: {e}")))?;

        Ok(Self { pool, config, metrics })
    }

    /// Acquire a connection from the pool.
    pub fn get_connection(&self) -> StorageResult<StoreConnection> {
        let start = std::time::Instant::now();

        match self.pool.get() {
            Ok(conn) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                self.metrics.record_connection_acquired(duration_ms);
                debug!(duration_ms, "connection acquired");
                Ok(StoreConnection::new(conn))
            }
            Err(e) => {
                let err_str = e.to_string().to_lowercase();
                if err_str.contains("timeout") || err_str.contains("timed out") {
                    self.metrics.record_connection_timeout();
                    warn!(timeout = ?self.config.connection_timeout, "connection timeout");
                    Err(StorageError::Timeout(self.config.connection_timeout.as_secs()))
                } else {
                    self.metrics.record_connection_error();
                    warn!("connection error: {e}");
                    Err(StorageError::Connection(format!("failed to get connection: {e}")))
                }
            }
        }
    }

    /// Verify the pool can hand out a working connection.
    pub fn health_check(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", &[], |row| row.get::<_, i32>(0))?;
        Ok(())
    }

    pub fn metrics(&self) -> &Arc<StorageMetrics> {
        &self.metrics
    }
}
