//! Bulk settings applier - host-facing calendar administration
//!
//! Either writes the property-wide default policy (wiping every per-date
//! override) or upserts overrides for an explicit date range.

use std::sync::Arc;

use chrono::NaiveDate;
use keystay_domain::dates::days_inclusive;
use keystay_domain::{CalendarDay, KeystayError, PropertySettings, Result};
use tracing::{error, info, instrument};

use super::ports::{CalendarRepository, PropertySettingsRepository};

/// The property-wide policy written by primary mode.
#[derive(Debug, Clone)]
pub struct DefaultPolicy {
    pub price_cents: i64,
    pub minimum_stay: u32,
    pub instant_book: bool,
    pub advance_notice_days: u32,
}

/// The per-date values written by range mode.
#[derive(Debug, Clone)]
pub struct DayOverride {
    pub is_available: bool,
    pub price_cents: Option<i64>,
    pub minimum_stay: Option<u32>,
    pub is_instant_book: bool,
}

/// Bulk settings applier.
pub struct CalendarAdminService {
    calendar_repo: Arc<dyn CalendarRepository>,
    settings_repo: Arc<dyn PropertySettingsRepository>,
}

impl CalendarAdminService {
    pub fn new(
        calendar_repo: Arc<dyn CalendarRepository>,
        settings_repo: Arc<dyn PropertySettingsRepository>,
    ) -> Self {
        Self { calendar_repo, settings_repo }
    }

    /// "Apply to all dates": wipe every per-date row for the property, then
    /// write the new defaults. No future rows are materialized; absence of
    /// a row plus the resolver's fallback keeps storage bounded regardless
    /// of horizon length. Returns the number of rows wiped.
    #[instrument(skip(self, policy))]
    pub async fn apply_primary(&self, property_id: &str, policy: DefaultPolicy) -> Result<usize> {
        let wiped = self.calendar_repo.delete_all_days(property_id).await?;

        self.settings_repo
            .upsert(PropertySettings {
                property_id: property_id.to_string(),
                default_price_cents: policy.price_cents,
                default_minimum_stay: policy.minimum_stay,
                default_instant_book: policy.instant_book,
                advance_notice_days: policy.advance_notice_days,
            })
            .await?;

        info!(property_id, wiped, "primary settings applied");
        Ok(wiped)
    }

    /// Write one override row per date of the inclusive range
    /// `[start, end]`. Last-write-wins; prior row contents are not merged.
    ///
    /// # Errors
    /// - [`KeystayError::InvalidInput`] when `end < start`
    /// - [`KeystayError::BulkApplyPartial`] when an upsert fails partway;
    ///   the counts tell the caller how much was written
    #[instrument(skip(self, values))]
    pub async fn apply_range(
        &self,
        property_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        values: DayOverride,
    ) -> Result<usize> {
        if end < start {
            return Err(KeystayError::InvalidInput(format!(
                "range end {end} precedes start {start}"
            )));
        }

        let dates: Vec<NaiveDate> = days_inclusive(start, end).collect();
        let requested = dates.len();

        for (applied, date) in dates.into_iter().enumerate() {
            let day = CalendarDay::override_for(
                property_id,
                date,
                values.is_available,
                values.price_cents,
                values.minimum_stay,
                values.is_instant_book,
            );
            if let Err(err) = self.calendar_repo.upsert_day(day).await {
                error!(property_id, %date, error = %err, "range apply failed partway");
                return Err(KeystayError::BulkApplyPartial { applied, requested });
            }
        }

        info!(property_id, requested, "range settings applied");
        Ok(requested)
    }
}
