//! SQLite-backed implementation of the CalendarRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use keystay_common::{SqlitePool, StorageError};
use keystay_core::CalendarRepository;
use keystay_domain::{CalendarDay, Result};
use rusqlite::ToSql;
use tracing::{debug, instrument};

use super::acquire;
use crate::errors::InfraError;

const UPSERT_DAY_SQL: &str = "INSERT INTO calendar_days (
        property_id, date, is_available, price_cents, minimum_stay,
        is_instant_book, notes, source_feed_id, booking_id, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT(property_id, date) DO UPDATE SET
        is_available = excluded.is_available,
        price_cents = excluded.price_cents,
        minimum_stay = excluded.minimum_stay,
        is_instant_book = excluded.is_instant_book,
        notes = excluded.notes,
        source_feed_id = excluded.source_feed_id,
        booking_id = excluded.booking_id,
        updated_at = excluded.updated_at";

const DAY_COLUMNS: &str = "property_id, date, is_available, price_cents, minimum_stay,
        is_instant_book, notes, source_feed_id, booking_id";

/// SQLite implementation of CalendarRepository.
pub struct SqliteCalendarRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteCalendarRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

fn row_to_day(row: &rusqlite::Row<'_>) -> rusqlite::Result<CalendarDay> {
    Ok(CalendarDay {
        property_id: row.get(0)?,
        date: row.get(1)?,
        is_available: row.get(2)?,
        price_cents: row.get(3)?,
        minimum_stay: row.get(4)?,
        is_instant_book: row.get(5)?,
        notes: row.get(6)?,
        source_feed_id: row.get(7)?,
        booking_id: row.get(8)?,
    })
}

#[async_trait]
impl CalendarRepository for SqliteCalendarRepository {
    #[instrument(skip(self, day), fields(property_id = %day.property_id, date = %day.date))]
    async fn upsert_day(&self, day: CalendarDay) -> Result<()> {
        let conn = acquire(&self.pool)?;
        let now = Utc::now().timestamp();

        conn.execute(
            UPSERT_DAY_SQL,
            [
                &day.property_id as &dyn ToSql,
                &day.date,
                &day.is_available,
                &day.price_cents,
                &day.minimum_stay,
                &day.is_instant_book,
                &day.notes,
                &day.source_feed_id,
                &day.booking_id,
                &now,
            ]
            .as_ref(),
        )
        .map_err(InfraError::from)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_day(&self, property_id: &str, date: NaiveDate) -> Result<Option<CalendarDay>> {
        let conn = acquire(&self.pool)?;

        let result = conn.query_row(
            &format!("SELECT {DAY_COLUMNS} FROM calendar_days WHERE property_id = ?1 AND date = ?2"),
            [&property_id as &dyn ToSql, &date].as_ref(),
            row_to_day,
        );

        match result {
            Ok(day) => Ok(Some(day)),
            Err(StorageError::Rusqlite(rusqlite::Error::QueryReturnedNoRows)) => Ok(None),
            Err(e) => Err(InfraError::from(e).into()),
        }
    }

    #[instrument(skip(self))]
    async fn list_days_in_range(
        &self,
        property_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CalendarDay>> {
        let conn = acquire(&self.pool)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {DAY_COLUMNS} FROM calendar_days
                 WHERE property_id = ?1 AND date >= ?2 AND date < ?3
                 ORDER BY date ASC"
            ))
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map([&property_id as &dyn ToSql, &from, &to].as_ref(), row_to_day)
            .map_err(InfraError::from)?;

        debug!(property_id, %from, %to, count = rows.len(), "listed calendar days");
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn delete_all_days(&self, property_id: &str) -> Result<usize> {
        let conn = acquire(&self.pool)?;

        let deleted = conn
            .execute(
                "DELETE FROM calendar_days WHERE property_id = ?1",
                [&property_id as &dyn ToSql].as_ref(),
            )
            .map_err(InfraError::from)?;

        debug!(property_id, deleted, "wiped calendar days");
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn delete_days_for_booking(
        &self,
        property_id: &str,
        booking_id: &str,
    ) -> Result<usize> {
        let conn = acquire(&self.pool)?;

        let deleted = conn
            .execute(
                "DELETE FROM calendar_days WHERE property_id = ?1 AND booking_id = ?2",
                [&property_id as &dyn ToSql, &booking_id].as_ref(),
            )
            .map_err(InfraError::from)?;

        debug!(property_id, booking_id, deleted, "reopened booking nights");
        Ok(deleted)
    }

    #[instrument(skip(self, days), fields(count = days.len()))]
    async fn replace_feed_blocks(
        &self,
        property_id: &str,
        feed_id: &str,
        days: Vec<CalendarDay>,
    ) -> Result<()> {
        let mut conn = acquire(&self.pool)?;
        let now = Utc::now().timestamp();

        // Delete-then-insert as one transaction, so a resync never exposes a
        // half-empty calendar to a concurrent reader.
        let tx = conn.transaction().map_err(InfraError::from)?;

        tx.execute(
            "DELETE FROM calendar_days WHERE property_id = ?1 AND source_feed_id = ?2",
            rusqlite::params![property_id, feed_id],
        )
        .map_err(InfraError::from)?;

        {
            let mut stmt = tx.prepare(UPSERT_DAY_SQL).map_err(InfraError::from)?;
            for day in &days {
                stmt.execute(rusqlite::params![
                    day.property_id,
                    day.date,
                    day.is_available,
                    day.price_cents,
                    day.minimum_stay,
                    day.is_instant_book,
                    day.notes,
                    day.source_feed_id,
                    day.booking_id,
                    now,
                ])
                .map_err(InfraError::from)?;
            }
        }

        tx.commit().map_err(InfraError::from)?;

        debug!(property_id, feed_id, "replaced feed blocks");
        Ok(())
    }
}
