//! External calendar feed types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::nights;
use crate::{KeystayError, Result};

/// Sync lifecycle state of one feed subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSyncStatus {
    Pending,
    Syncing,
    Success,
    Error,
}

impl FeedSyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Syncing => "syncing",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "syncing" => Ok(Self::Syncing),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            other => Err(KeystayError::InvalidInput(format!("unknown sync status: {other}"))),
        }
    }
}

/// One configured external calendar subscription for a property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalCalendarFeed {
    pub id: String,
    pub property_id: String,
    /// Source label shown to the host, e.g. "Airbnb".
    pub name: String,
    pub url: String,
    pub is_active: bool,
    pub sync_status: FeedSyncStatus,
    pub sync_error: Option<String>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A blocked date range parsed out of one external feed document.
///
/// Transient: only its per-night expansion into calendar rows is persisted.
/// `end_date` is exclusive, matching check-in/check-out semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedRange {
    pub property_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Stamped by the sync orchestrator; the parser leaves it as "pending".
    pub source_name: String,
    pub external_id: String,
    pub summary: Option<String>,
}

impl BlockedRange {
    /// The blocked nights, checkout day excluded.
    pub fn nights(&self) -> impl Iterator<Item = NaiveDate> {
        nights(self.start_date, self.end_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_status_round_trips() {
        for status in [
            FeedSyncStatus::Pending,
            FeedSyncStatus::Syncing,
            FeedSyncStatus::Success,
            FeedSyncStatus::Error,
        ] {
            assert_eq!(FeedSyncStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(FeedSyncStatus::parse("stalled").is_err());
    }

    #[test]
    fn blocked_range_expands_to_nights() {
        let range = BlockedRange {
            property_id: "prop-1".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
            source_name: "pending".into(),
            external_id: "evt-1".into(),
            summary: None,
        };
        assert_eq!(range.nights().count(), 3);
    }
}
