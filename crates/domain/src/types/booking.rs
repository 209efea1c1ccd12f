//! Booking ledger types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::night_count;
use crate::{KeystayError, Result};

/// Reservation lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(KeystayError::InvalidInput(format!("unknown booking status: {other}"))),
        }
    }
}

/// One confirmed or pending reservation.
///
/// `check_out` is exclusive: the last occupied night is `check_out - 1 day`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub property_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub status: BookingStatus,
    pub guests: u32,
    pub total_cents: i64,
    pub payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Number of occupied nights.
    pub fn nights(&self) -> u64 {
        night_count(self.check_in, self.check_out)
    }
}

/// Incoming booking submission, before it has an id or a ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub property_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub total_cents: i64,
    pub payment_ref: Option<String>,
}

impl BookingRequest {
    /// Materialize a ledger row from this request.
    pub fn into_booking(self, status: BookingStatus, created_at: DateTime<Utc>) -> Booking {
        Booking {
            id: Uuid::now_v7().to_string(),
            property_id: self.property_id,
            check_in: self.check_in,
            check_out: self.check_out,
            status,
            guests: self.guests,
            total_cents: self.total_cents,
            payment_ref: self.payment_ref,
            created_at,
        }
    }
}
