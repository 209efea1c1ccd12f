//! Calendar store row type.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row per `(property_id, date)` in the calendar store.
///
/// Absence of a row means "use property defaults, available". Provenance is
/// explicit: `source_feed_id` for external sync blocks, `booking_id` for
/// internal blocks; `notes` is display-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub property_id: String,
    pub date: NaiveDate,
    pub is_available: bool,
    /// `None` falls back to the property's default price.
    pub price_cents: Option<i64>,
    /// `None` falls back to the property's default minimum stay.
    pub minimum_stay: Option<u32>,
    pub is_instant_book: bool,
    pub notes: Option<String>,
    pub source_feed_id: Option<String>,
    pub booking_id: Option<String>,
}

impl CalendarDay {
    /// A host override for one date.
    pub fn override_for(
        property_id: impl Into<String>,
        date: NaiveDate,
        is_available: bool,
        price_cents: Option<i64>,
        minimum_stay: Option<u32>,
        is_instant_book: bool,
    ) -> Self {
        Self {
            property_id: property_id.into(),
            date,
            is_available,
            price_cents,
            minimum_stay,
            is_instant_book,
            notes: None,
            source_feed_id: None,
            booking_id: None,
        }
    }

    /// A date blocked by an external feed sync.
    pub fn feed_block(
        property_id: impl Into<String>,
        date: NaiveDate,
        feed_id: impl Into<String>,
        source_name: &str,
    ) -> Self {
        Self {
            property_id: property_id.into(),
            date,
            is_available: false,
            price_cents: None,
            minimum_stay: None,
            is_instant_book: false,
            notes: Some(format!("Blocked by {source_name} sync")),
            source_feed_id: Some(feed_id.into()),
            booking_id: None,
        }
    }

    /// A date blocked by an internal confirmed booking.
    pub fn booking_block(
        property_id: impl Into<String>,
        date: NaiveDate,
        booking_id: impl Into<String>,
    ) -> Self {
        Self {
            property_id: property_id.into(),
            date,
            is_available: false,
            price_cents: None,
            minimum_stay: None,
            is_instant_book: false,
            notes: Some("Booked".into()),
            source_feed_id: None,
            booking_id: Some(booking_id.into()),
        }
    }
}
