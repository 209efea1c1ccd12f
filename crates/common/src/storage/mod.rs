//! SQLite storage backend
//!
//! Provides an r2d2-based connection pool over rusqlite with WAL mode and
//! busy-timeout handling applied to every pooled connection.

pub mod config;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod pragmas;

pub use config::SqlitePoolConfig;
pub use connection::{StoreConnection, StoreStatement};
pub use error::{StorageError, StorageResult};
pub use metrics::StorageMetrics;
pub use pool::SqlitePool;
pub use pragmas::apply_connection_pragmas;
