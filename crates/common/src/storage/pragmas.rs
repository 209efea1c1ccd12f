//! Per-connection pragma setup.

use rusqlite::Connection;

use super::config::SqlitePoolConfig;

/// Apply the standard connection pragmas.
///
/// Runs on every connection the pool hands out, so pragmas that are
/// per-connection (busy timeout, foreign keys) stay consistent across the
/// pool.
pub fn apply_connection_pragmas(
    conn: &Connection,
    config: &SqlitePoolConfig,
) -> rusqlite::Result<()> {
    conn.busy_timeout(config.busy_timeout)?;

    if config.wal {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
    }

    if config.foreign_keys {
        conn.pragma_update(None, "foreign_keys", "ON")?;
    }

    Ok(())
}
