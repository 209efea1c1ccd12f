//! Property-wide default settings.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MINIMUM_STAY;

/// The property-wide fallback policy applied to any date lacking an explicit
/// calendar override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySettings {
    pub property_id: String,
    pub default_price_cents: i64,
    pub default_minimum_stay: u32,
    pub default_instant_book: bool,
    /// Days of advance notice required before check-in.
    pub advance_notice_days: u32,
}

impl PropertySettings {
    /// Conservative defaults for a property that has never been configured.
    pub fn fallback(property_id: impl Into<String>) -> Self {
        Self {
            property_id: property_id.into(),
            default_price_cents: 0,
            default_minimum_stay: DEFAULT_MINIMUM_STAY,
            default_instant_book: false,
            advance_notice_days: 0,
        }
    }
}
