//! SQLite-backed implementation of the FeedRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keystay_common::SqlitePool;
use keystay_core::FeedRepository;
use keystay_domain::{ExternalCalendarFeed, FeedSyncStatus, KeystayError, Result};
use rusqlite::ToSql;
use tracing::{debug, instrument};

use super::acquire;
use crate::errors::InfraError;

const FEED_COLUMNS: &str =
    "id, property_id, name, url, is_active, sync_status, sync_error, last_sync_at, created_at";

/// SQLite implementation of FeedRepository.
pub struct SqliteFeedRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteFeedRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    fn update_status(&self, feed_id: &str, sql: &str, params: &[&dyn ToSql]) -> Result<()> {
        let conn = acquire(&self.pool)?;
        let updated = conn.execute(sql, params).map_err(InfraError::from)?;
        if updated == 0 {
            return Err(KeystayError::NotFound(format!("feed {feed_id}")));
        }
        Ok(())
    }
}

fn timestamp_column(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<i64> = row.get(idx)?;
    raw.map(|secs| {
        DateTime::from_timestamp(secs, 0).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Integer,
                format!("timestamp out of range: {secs}").into(),
            )
        })
    })
    .transpose()
}

fn row_to_feed(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExternalCalendarFeed> {
    let status_raw: String = row.get(5)?;
    let sync_status = FeedSyncStatus::parse(&status_raw).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown sync status: {status_raw}").into(),
        )
    })?;

    Ok(ExternalCalendarFeed {
        id: row.get(0)?,
        property_id: row.get(1)?,
        name: row.get(2)?,
        url: row.get(3)?,
        is_active: row.get(4)?,
        sync_status,
        sync_error: row.get(6)?,
        last_sync_at: timestamp_column(row, 7)?,
        created_at: timestamp_column(row, 8)?.unwrap_or_default(),
    })
}

#[async_trait]
impl FeedRepository for SqliteFeedRepository {
    #[instrument(skip(self, feed), fields(feed_id = %feed.id, property_id = %feed.property_id))]
    async fn insert(&self, feed: ExternalCalendarFeed) -> Result<()> {
        let conn = acquire(&self.pool)?;

        conn.execute(
            "INSERT INTO external_calendar_feeds
                 (id, property_id, name, url, is_active, sync_status, sync_error,
                  last_sync_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            [
                &feed.id as &dyn ToSql,
                &feed.property_id,
                &feed.name,
                &feed.url,
                &feed.is_active,
                &feed.sync_status.as_str(),
                &feed.sync_error,
                &feed.last_sync_at.map(|t| t.timestamp()),
                &feed.created_at.timestamp(),
            ]
            .as_ref(),
        )
        .map_err(InfraError::from)?;

        debug!("feed subscription created");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, feed_id: &str) -> Result<ExternalCalendarFeed> {
        let conn = acquire(&self.pool)?;

        conn.query_row(
            &format!("SELECT {FEED_COLUMNS} FROM external_calendar_feeds WHERE id = ?1"),
            [&feed_id as &dyn ToSql].as_ref(),
            row_to_feed,
        )
        .map_err(|e| match e {
            keystay_common::StorageError::Rusqlite(rusqlite::Error::QueryReturnedNoRows) => {
                KeystayError::NotFound(format!("feed {feed_id}"))
            }
            other => InfraError::from(other).into(),
        })
    }

    #[instrument(skip(self))]
    async fn list_active(&self, property_id: &str) -> Result<Vec<ExternalCalendarFeed>> {
        let conn = acquire(&self.pool)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {FEED_COLUMNS} FROM external_calendar_feeds
                 WHERE property_id = ?1 AND is_active = 1
                 ORDER BY created_at ASC, id ASC"
            ))
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map([&property_id as &dyn ToSql].as_ref(), row_to_feed)
            .map_err(InfraError::from)?;

        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn delete(&self, feed_id: &str) -> Result<()> {
        let conn = acquire(&self.pool)?;
        conn.execute(
            "DELETE FROM external_calendar_feeds WHERE id = ?1",
            [&feed_id as &dyn ToSql].as_ref(),
        )
        .map_err(InfraError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_syncing(&self, feed_id: &str, at: DateTime<Utc>) -> Result<()> {
        self.update_status(
            feed_id,
            "UPDATE external_calendar_feeds
                 SET sync_status = 'syncing', last_sync_at = ?1
                 WHERE id = ?2",
            [&at.timestamp() as &dyn ToSql, &feed_id].as_ref(),
        )
    }

    #[instrument(skip(self))]
    async fn mark_success(&self, feed_id: &str) -> Result<()> {
        self.update_status(
            feed_id,
            "UPDATE external_calendar_feeds
                 SET sync_status = 'success', sync_error = NULL
                 WHERE id = ?1",
            [&feed_id as &dyn ToSql].as_ref(),
        )
    }

    #[instrument(skip(self, message))]
    async fn mark_error(&self, feed_id: &str, message: &str) -> Result<()> {
        self.update_status(
            feed_id,
            "UPDATE external_calendar_feeds
                 SET sync_status = 'error', sync_error = ?1
                 WHERE id = ?2",
            [&message as &dyn ToSql, &feed_id].as_ref(),
        )
    }
}
