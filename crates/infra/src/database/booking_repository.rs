//! SQLite-backed implementation of the BookingRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use keystay_common::SqlitePool;
use keystay_core::BookingRepository;
use keystay_domain::{Booking, BookingStatus, KeystayError, Result};
use rusqlite::{OptionalExtension, ToSql};
use tracing::{debug, instrument};

use super::acquire;
use crate::errors::InfraError;

const BOOKING_COLUMNS: &str =
    "id, property_id, check_in, check_out, status, guests, total_cents, payment_ref, created_at";

/// SQLite implementation of BookingRepository.
pub struct SqliteBookingRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteBookingRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

fn row_to_booking(row: &rusqlite::Row<'_>) -> rusqlite::Result<Booking> {
    let status_raw: String = row.get(4)?;
    let status = BookingStatus::parse(&status_raw).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown booking status: {status_raw}").into(),
        )
    })?;

    let created_ts: i64 = row.get(8)?;
    let created_at = chrono::DateTime::from_timestamp(created_ts, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            8,
            rusqlite::types::Type::Integer,
            format!("timestamp out of range: {created_ts}").into(),
        )
    })?;

    Ok(Booking {
        id: row.get(0)?,
        property_id: row.get(1)?,
        check_in: row.get(2)?,
        check_out: row.get(3)?,
        status,
        guests: row.get(5)?,
        total_cents: row.get(6)?,
        payment_ref: row.get(7)?,
        created_at,
    })
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    /// Conflict check and insert as one immediate transaction. The half-open
    /// overlap predicate (`check_in < ?new_out AND check_out > ?new_in`)
    /// makes a check-in on another booking's check-out day legal.
    #[instrument(skip(self, booking), fields(property_id = %booking.property_id))]
    async fn reserve(&self, booking: Booking) -> Result<Booking> {
        let mut conn = acquire(&self.pool)?;
        let tx = conn.transaction().map_err(InfraError::from)?;

        let conflict: Option<(NaiveDate, NaiveDate)> = tx
            .query_row(
                "SELECT check_in, check_out FROM bookings
                 WHERE property_id = ?1
                   AND status != 'cancelled'
                   AND check_in < ?3 AND check_out > ?2
                 ORDER BY check_in ASC
                 LIMIT 1",
                rusqlite::params![booking.property_id, booking.check_in, booking.check_out],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(InfraError::from)?;

        if let Some((conflict_start, conflict_end)) = conflict {
            // Dropping the transaction rolls it back.
            return Err(KeystayError::DatesUnavailable { conflict_start, conflict_end });
        }

        tx.execute(
            "INSERT INTO bookings (id, property_id, check_in, check_out, status,
                                   guests, total_cents, payment_ref, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                booking.id,
                booking.property_id,
                booking.check_in,
                booking.check_out,
                booking.status.as_str(),
                booking.guests,
                booking.total_cents,
                booking.payment_ref,
                booking.created_at.timestamp(),
            ],
        )
        .map_err(InfraError::from)?;

        tx.commit().map_err(InfraError::from)?;

        debug!(booking_id = %booking.id, "booking reserved");
        Ok(booking)
    }

    #[instrument(skip(self))]
    async fn get(&self, booking_id: &str) -> Result<Booking> {
        let conn = acquire(&self.pool)?;

        conn.query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            [&booking_id as &dyn ToSql].as_ref(),
            row_to_booking,
        )
        .map_err(|e| match e {
            keystay_common::StorageError::Rusqlite(rusqlite::Error::QueryReturnedNoRows) => {
                KeystayError::NotFound(format!("booking {booking_id}"))
            }
            other => InfraError::from(other).into(),
        })
    }

    #[instrument(skip(self))]
    async fn set_status(&self, booking_id: &str, status: BookingStatus) -> Result<()> {
        let conn = acquire(&self.pool)?;

        let updated = conn
            .execute(
                "UPDATE bookings SET status = ?1 WHERE id = ?2",
                [&status.as_str() as &dyn ToSql, &booking_id].as_ref(),
            )
            .map_err(InfraError::from)?;

        if updated == 0 {
            return Err(KeystayError::NotFound(format!("booking {booking_id}")));
        }

        debug!(booking_id, status = status.as_str(), "booking status updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_confirmed_overlapping(
        &self,
        property_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Booking>> {
        let conn = acquire(&self.pool)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings
                 WHERE property_id = ?1 AND status = 'confirmed'
                   AND check_in < ?3 AND check_out > ?2
                 ORDER BY check_in ASC"
            ))
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map([&property_id as &dyn ToSql, &from, &to].as_ref(), row_to_booking)
            .map_err(InfraError::from)?;

        Ok(rows)
    }
}
