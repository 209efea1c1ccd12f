//! Availability resolver answer types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Why a date resolved as unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Strictly before today; past dates are never bookable.
    Past,
    /// Covered by a confirmed booking in the ledger.
    Booked,
    /// Host marked the date unavailable.
    HostBlocked,
    /// An external feed sync blocked the date.
    ExternalBlocked,
}

/// The resolver's per-date answer, consumed by calendars and the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub date: NaiveDate,
    pub is_available: bool,
    pub price_cents: i64,
    pub minimum_stay: u32,
    pub is_instant_book: bool,
    /// Set only when `is_available` is false.
    pub reason: Option<UnavailableReason>,
}
