//! Pool construction with domain-level error mapping.

use std::path::Path;
use std::sync::Arc;

use keystay_common::{SqlitePool, SqlitePoolConfig};
use keystay_domain::{KeystayError, Result};

/// Create a shared SQLite pool for the engine database.
pub fn create_pool(path: &Path, config: SqlitePoolConfig) -> Result<Arc<SqlitePool>> {
    SqlitePool::new(path, config)
        .map(Arc::new)
        .map_err(|e| KeystayError::Database(format!("failed to create pool: {e}")))
}
