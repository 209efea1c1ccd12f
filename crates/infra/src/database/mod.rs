//! Database implementations

pub mod booking_repository;
pub mod calendar_repository;
pub mod feed_repository;
pub mod manager;
pub mod settings_repository;
pub mod sqlite_pool;

pub use booking_repository::SqliteBookingRepository;
pub use calendar_repository::SqliteCalendarRepository;
pub use feed_repository::SqliteFeedRepository;
pub use manager::DbManager;
pub use settings_repository::SqlitePropertySettingsRepository;
pub use sqlite_pool::create_pool;

use keystay_common::{SqlitePool, StoreConnection};
use keystay_domain::{KeystayError, Result};

/// Acquire a pooled connection, mapping storage errors to the domain.
pub(crate) fn acquire(pool: &SqlitePool) -> Result<StoreConnection> {
    pool.get_connection()
        .map_err(|e| KeystayError::Database(format!("failed to get database connection: {e}")))
}
