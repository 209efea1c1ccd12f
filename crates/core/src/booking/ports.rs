//! Port interface for the booking ledger.

use async_trait::async_trait;
use chrono::NaiveDate;
use keystay_domain::{Booking, BookingStatus, Result};

/// Persistence port for reservations.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert `booking` if and only if `[check_in, check_out)` does not
    /// intersect any non-cancelled booking for the same property.
    ///
    /// The overlap check and the insert MUST be one atomic unit (a
    /// transaction or equivalent), so two concurrent submissions for
    /// overlapping dates cannot both succeed.
    ///
    /// # Errors
    /// [`keystay_domain::KeystayError::DatesUnavailable`] naming the
    /// conflicting range when the dates intersect an existing booking.
    async fn reserve(&self, booking: Booking) -> Result<Booking>;

    async fn get(&self, booking_id: &str) -> Result<Booking>;

    async fn set_status(&self, booking_id: &str, status: BookingStatus) -> Result<()>;

    /// Confirmed bookings whose `[check_in, check_out)` intersects
    /// `[from, to)`.
    async fn list_confirmed_overlapping(
        &self,
        property_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Booking>>;
}
