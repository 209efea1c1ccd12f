//! SQLite-backed implementation of the PropertySettingsRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use keystay_common::{SqlitePool, StorageError};
use keystay_core::PropertySettingsRepository;
use keystay_domain::{PropertySettings, Result};
use rusqlite::ToSql;
use tracing::{debug, instrument};

use super::acquire;
use crate::errors::InfraError;

/// SQLite implementation of PropertySettingsRepository.
pub struct SqlitePropertySettingsRepository {
    pool: Arc<SqlitePool>,
}

impl SqlitePropertySettingsRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PropertySettingsRepository for SqlitePropertySettingsRepository {
    #[instrument(skip(self))]
    async fn get(&self, property_id: &str) -> Result<Option<PropertySettings>> {
        let conn = acquire(&self.pool)?;

        let result = conn.query_row(
            "SELECT property_id, default_price_cents, default_minimum_stay,
                    default_instant_book, advance_notice_days
             FROM property_settings
             WHERE property_id = ?1",
            [&property_id as &dyn ToSql].as_ref(),
            |row| {
                Ok(PropertySettings {
                    property_id: row.get(0)?,
                    default_price_cents: row.get(1)?,
                    default_minimum_stay: row.get(2)?,
                    default_instant_book: row.get(3)?,
                    advance_notice_days: row.get(4)?,
                })
            },
        );

        match result {
            Ok(settings) => Ok(Some(settings)),
            Err(StorageError::Rusqlite(rusqlite::Error::QueryReturnedNoRows)) => Ok(None),
            Err(e) => Err(InfraError::from(e).into()),
        }
    }

    #[instrument(skip(self, settings), fields(property_id = %settings.property_id))]
    async fn upsert(&self, settings: PropertySettings) -> Result<()> {
        let conn = acquire(&self.pool)?;
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO property_settings
                 (property_id, default_price_cents, default_minimum_stay,
                  default_instant_book, advance_notice_days, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(property_id) DO UPDATE SET
                 default_price_cents = excluded.default_price_cents,
                 default_minimum_stay = excluded.default_minimum_stay,
                 default_instant_book = excluded.default_instant_book,
                 advance_notice_days = excluded.advance_notice_days,
                 updated_at = excluded.updated_at",
            [
                &settings.property_id as &dyn ToSql,
                &settings.default_price_cents,
                &settings.default_minimum_stay,
                &settings.default_instant_book,
                &settings.advance_notice_days,
                &now,
            ]
            .as_ref(),
        )
        .map_err(InfraError::from)?;

        debug!("property settings upserted");
        Ok(())
    }
}
