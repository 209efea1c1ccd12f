//! Port interfaces for the calendar store and property settings.
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chrono::NaiveDate;
use keystay_domain::{CalendarDay, PropertySettings, Result};

/// Persistence port for per-date calendar rows.
#[async_trait]
pub trait CalendarRepository: Send + Sync {
    /// Insert or overwrite the row for `(day.property_id, day.date)`.
    /// Last-write-wins; no merge with prior row contents.
    async fn upsert_day(&self, day: CalendarDay) -> Result<()>;

    /// Fetch one row, if present.
    async fn get_day(&self, property_id: &str, date: NaiveDate) -> Result<Option<CalendarDay>>;

    /// Rows for `[from, to)`, ordered by date.
    async fn list_days_in_range(
        &self,
        property_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CalendarDay>>;

    /// Wipe every row for the property. Returns the number deleted.
    async fn delete_all_days(&self, property_id: &str) -> Result<usize>;

    /// Reopen the nights a booking had blocked. Returns the number deleted.
    async fn delete_days_for_booking(&self, property_id: &str, booking_id: &str)
        -> Result<usize>;

    /// Replace every row previously derived from `feed_id` with `days`, as
    /// one atomic unit, so a resync never exposes a half-empty calendar.
    async fn replace_feed_blocks(
        &self,
        property_id: &str,
        feed_id: &str,
        days: Vec<CalendarDay>,
    ) -> Result<()>;
}

/// Persistence port for property-wide default settings.
#[async_trait]
pub trait PropertySettingsRepository: Send + Sync {
    async fn get(&self, property_id: &str) -> Result<Option<PropertySettings>>;

    async fn upsert(&self, settings: PropertySettings) -> Result<()>;
}
