//! Booking service - conflict guard and reservation lifecycle
//!
//! Validates booking submissions, hands them to the ledger's atomic
//! reserve-or-reject, and keeps the calendar store in step when bookings
//! are confirmed or cancelled.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use keystay_domain::dates::nights;
use keystay_domain::{
    Booking, BookingRequest, BookingStatus, CalendarDay, KeystayError, Result,
};
use tracing::{info, instrument, warn};

use super::ports::BookingRepository;
use crate::calendar::ports::CalendarRepository;

/// Booking service.
pub struct BookingService {
    booking_repo: Arc<dyn BookingRepository>,
    calendar_repo: Arc<dyn CalendarRepository>,
}

impl BookingService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        calendar_repo: Arc<dyn CalendarRepository>,
    ) -> Self {
        Self { booking_repo, calendar_repo }
    }

    /// Submit a new booking.
    ///
    /// The conflict check runs against the authoritative ledger at commit
    /// time inside [`BookingRepository::reserve`], not against any cached
    /// calendar state, so two concurrent submissions for overlapping dates
    /// cannot both succeed.
    ///
    /// # Errors
    /// - [`KeystayError::InvalidInput`] for an inverted range, a past
    ///   check-in, or zero guests
    /// - [`KeystayError::DatesUnavailable`] when the range intersects an
    ///   existing non-cancelled booking; the caller must re-prompt rather
    ///   than adjust dates silently
    pub async fn request_booking(&self, request: BookingRequest) -> Result<Booking> {
        self.request_booking_at(request, Utc::now()).await
    }

    /// Submit with an explicit "now".
    #[instrument(skip(self, request), fields(property_id = %request.property_id))]
    pub async fn request_booking_at(
        &self,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        if request.check_out <= request.check_in {
            return Err(KeystayError::InvalidInput(format!(
                "check-out {} must be after check-in {}",
                request.check_out, request.check_in
            )));
        }
        if request.check_in < now.date_naive() {
            return Err(KeystayError::InvalidInput(format!(
                "check-in {} is in the past",
                request.check_in
            )));
        }
        if request.guests == 0 {
            return Err(KeystayError::InvalidInput("at least one guest is required".into()));
        }

        let booking = request.into_booking(BookingStatus::Pending, now);
        let booking = self.booking_repo.reserve(booking).await?;

        info!(
            booking_id = %booking.id,
            check_in = %booking.check_in,
            check_out = %booking.check_out,
            "booking reserved"
        );

        Ok(booking)
    }

    /// Confirm a pending booking (payment settled) and block its nights in
    /// the calendar store.
    #[instrument(skip(self))]
    pub async fn confirm_booking(&self, booking_id: &str) -> Result<Booking> {
        let mut booking = self.booking_repo.get(booking_id).await?;

        match booking.status {
            BookingStatus::Cancelled => {
                return Err(KeystayError::InvalidInput(format!(
                    "booking {booking_id} is cancelled and cannot be confirmed"
                )));
            }
            BookingStatus::Confirmed => return Ok(booking),
            BookingStatus::Pending => {}
        }

        self.booking_repo.set_status(booking_id, BookingStatus::Confirmed).await?;
        booking.status = BookingStatus::Confirmed;

        for night in nights(booking.check_in, booking.check_out) {
            self.calendar_repo
                .upsert_day(CalendarDay::booking_block(&booking.property_id, night, booking_id))
                .await?;
        }

        info!(booking_id, nights = booking.nights(), "booking confirmed");
        Ok(booking)
    }

    /// Cancel a booking and reopen its nights.
    #[instrument(skip(self))]
    pub async fn cancel_booking(&self, booking_id: &str) -> Result<()> {
        let booking = self.booking_repo.get(booking_id).await?;

        if booking.status == BookingStatus::Cancelled {
            warn!(booking_id, "booking already cancelled");
            return Ok(());
        }

        self.booking_repo.set_status(booking_id, BookingStatus::Cancelled).await?;

        let reopened = self
            .calendar_repo
            .delete_days_for_booking(&booking.property_id, booking_id)
            .await?;

        info!(booking_id, reopened, "booking cancelled, dates reopened");
        Ok(())
    }
}
