//! Availability resolver - core business logic
//!
//! Answers "is this date bookable, at what price, under what constraints" by
//! merging the calendar store, the booking ledger, and the current date.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use keystay_domain::dates::{coalesce_nights, nights};
use keystay_domain::ical::build_calendar;
use keystay_domain::{
    Availability, CalendarDay, KeystayError, PropertySettings, Result, UnavailableReason,
};
use tracing::instrument;

use crate::booking::ports::BookingRepository;
use crate::calendar::ports::{CalendarRepository, PropertySettingsRepository};

/// Availability resolver service.
pub struct AvailabilityService {
    calendar_repo: Arc<dyn CalendarRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    settings_repo: Arc<dyn PropertySettingsRepository>,
}

impl AvailabilityService {
    pub fn new(
        calendar_repo: Arc<dyn CalendarRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        settings_repo: Arc<dyn PropertySettingsRepository>,
    ) -> Self {
        Self { calendar_repo, booking_repo, settings_repo }
    }

    /// Resolve a single date against today's calendar.
    pub async fn resolve(&self, property_id: &str, date: NaiveDate) -> Result<Availability> {
        self.resolve_on(property_id, date, Utc::now().date_naive()).await
    }

    /// Resolve a single date with an explicit "today".
    pub async fn resolve_on(
        &self,
        property_id: &str,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Availability> {
        let end = date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| KeystayError::InvalidInput(format!("date out of range: {date}")))?;
        let mut days = self.resolve_range_on(property_id, date, end, today).await?;
        days.pop()
            .ok_or_else(|| KeystayError::Internal("resolver produced no answer".into()))
    }

    /// Resolve every date of `[from, to)` with an explicit "today".
    ///
    /// Precedence per date, highest wins:
    /// 1. strictly before `today`: never bookable
    /// 2. covered by a confirmed booking: never bookable, even if a host or
    ///    external sync marked the date available
    /// 3. an explicit calendar row: its values, defaults filling the gaps
    /// 4. property defaults: available
    #[instrument(skip(self))]
    pub async fn resolve_range_on(
        &self,
        property_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        today: NaiveDate,
    ) -> Result<Vec<Availability>> {
        if to <= from {
            return Ok(Vec::new());
        }

        let settings = self
            .settings_repo
            .get(property_id)
            .await?
            .unwrap_or_else(|| PropertySettings::fallback(property_id));

        let bookings =
            self.booking_repo.list_confirmed_overlapping(property_id, from, to).await?;

        let overrides: HashMap<NaiveDate, CalendarDay> = self
            .calendar_repo
            .list_days_in_range(property_id, from, to)
            .await?
            .into_iter()
            .map(|day| (day.date, day))
            .collect();

        let mut out = Vec::with_capacity(to.signed_duration_since(from).num_days() as usize);

        for date in nights(from, to) {
            if date < today {
                out.push(unavailable(date, UnavailableReason::Past, &settings));
                continue;
            }

            let booked =
                bookings.iter().any(|b| b.check_in <= date && date < b.check_out);
            if booked {
                out.push(unavailable(date, UnavailableReason::Booked, &settings));
                continue;
            }

            match overrides.get(&date) {
                Some(row) if row.is_available => out.push(Availability {
                    date,
                    is_available: true,
                    price_cents: row.price_cents.unwrap_or(settings.default_price_cents),
                    minimum_stay: row.minimum_stay.unwrap_or(settings.default_minimum_stay),
                    is_instant_book: row.is_instant_book,
                    reason: None,
                }),
                Some(row) => {
                    let reason = if row.booking_id.is_some() {
                        UnavailableReason::Booked
                    } else if row.source_feed_id.is_some() {
                        UnavailableReason::ExternalBlocked
                    } else {
                        UnavailableReason::HostBlocked
                    };
                    out.push(Availability {
                        date,
                        is_available: false,
                        price_cents: row.price_cents.unwrap_or(settings.default_price_cents),
                        minimum_stay: row.minimum_stay.unwrap_or(settings.default_minimum_stay),
                        is_instant_book: row.is_instant_book,
                        reason: Some(reason),
                    });
                }
                None => out.push(Availability {
                    date,
                    is_available: true,
                    price_cents: settings.default_price_cents,
                    minimum_stay: settings.default_minimum_stay,
                    is_instant_book: settings.default_instant_book,
                    reason: None,
                }),
            }
        }

        Ok(out)
    }

    /// The property's currently blocked dates as half-open ranges, looking
    /// `horizon_days` ahead from `today`.
    pub async fn blocked_ranges_on(
        &self,
        property_id: &str,
        today: NaiveDate,
        horizon_days: u32,
    ) -> Result<Vec<(NaiveDate, NaiveDate)>> {
        let to = today
            .checked_add_days(Days::new(u64::from(horizon_days)))
            .ok_or_else(|| KeystayError::InvalidInput("horizon out of range".into()))?;

        let resolved = self.resolve_range_on(property_id, today, to, today).await?;
        let blocked: Vec<NaiveDate> =
            resolved.iter().filter(|a| !a.is_available).map(|a| a.date).collect();

        Ok(coalesce_nights(&blocked))
    }

    /// Build the property-level export document from the resolver's answer,
    /// so the outbound calendar always agrees with inbound availability.
    pub async fn export_calendar(
        &self,
        property_id: &str,
        property_label: &str,
        horizon_days: u32,
    ) -> Result<String> {
        let now = Utc::now();
        self.export_calendar_on(property_id, property_label, horizon_days, now).await
    }

    /// Export with an explicit generation instant.
    pub async fn export_calendar_on(
        &self,
        property_id: &str,
        property_label: &str,
        horizon_days: u32,
        generated_at: DateTime<Utc>,
    ) -> Result<String> {
        let ranges = self
            .blocked_ranges_on(property_id, generated_at.date_naive(), horizon_days)
            .await?;
        Ok(build_calendar(property_id, property_label, &ranges, generated_at))
    }
}

fn unavailable(
    date: NaiveDate,
    reason: UnavailableReason,
    settings: &PropertySettings,
) -> Availability {
    Availability {
        date,
        is_available: false,
        price_cents: settings.default_price_cents,
        minimum_stay: settings.default_minimum_stay,
        is_instant_book: settings.default_instant_book,
        reason: Some(reason),
    }
}

#[cfg(test)]
mod tests {
    use keystay_domain::{BookingStatus, CalendarDay};

    use super::*;
    use crate::testing::{
        fixture_booking, fixture_settings, InMemoryBookingRepository,
        InMemoryCalendarRepository, InMemorySettingsRepository,
    };

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn service() -> (
        AvailabilityService,
        Arc<InMemoryCalendarRepository>,
        Arc<InMemoryBookingRepository>,
        Arc<InMemorySettingsRepository>,
    ) {
        let calendar = Arc::new(InMemoryCalendarRepository::new());
        let bookings = Arc::new(InMemoryBookingRepository::new());
        let settings = Arc::new(InMemorySettingsRepository::new());
        let service = AvailabilityService::new(
            Arc::clone(&calendar) as Arc<dyn CalendarRepository>,
            Arc::clone(&bookings) as Arc<dyn BookingRepository>,
            Arc::clone(&settings) as Arc<dyn PropertySettingsRepository>,
        );
        (service, calendar, bookings, settings)
    }

    const TODAY: (i32, u32, u32) = (2024, 6, 1);

    fn today() -> NaiveDate {
        d(TODAY.0, TODAY.1, TODAY.2)
    }

    #[tokio::test]
    async fn past_dates_are_never_bookable() {
        let (service, calendar, _, _) = service();

        // Even an explicitly available override can't make the past bookable.
        calendar
            .upsert_day(CalendarDay::override_for("prop-1", d(2024, 5, 20), true, None, None, true))
            .await
            .unwrap();

        let answer = service.resolve_on("prop-1", d(2024, 5, 20), today()).await.unwrap();
        assert!(!answer.is_available);
        assert_eq!(answer.reason, Some(UnavailableReason::Past));
    }

    #[tokio::test]
    async fn confirmed_booking_blocks_every_night_but_not_checkout() {
        let (service, _, bookings, _) = service();
        bookings
            .seed(fixture_booking("prop-1", d(2024, 6, 10), d(2024, 6, 15), BookingStatus::Confirmed))
            .await;

        for day in 10..15 {
            let answer = service.resolve_on("prop-1", d(2024, 6, day), today()).await.unwrap();
            assert!(!answer.is_available, "night {day} should be booked");
            assert_eq!(answer.reason, Some(UnavailableReason::Booked));
        }

        let checkout = service.resolve_on("prop-1", d(2024, 6, 15), today()).await.unwrap();
        assert!(checkout.is_available, "checkout day is a legal turnover day");
    }

    #[tokio::test]
    async fn booking_wins_over_available_override() {
        let (service, calendar, bookings, _) = service();
        bookings
            .seed(fixture_booking("prop-1", d(2024, 6, 10), d(2024, 6, 12), BookingStatus::Confirmed))
            .await;
        calendar
            .upsert_day(CalendarDay::override_for(
                "prop-1",
                d(2024, 6, 10),
                true,
                Some(9_900),
                None,
                true,
            ))
            .await
            .unwrap();

        let answer = service.resolve_on("prop-1", d(2024, 6, 10), today()).await.unwrap();
        assert!(!answer.is_available);
        assert_eq!(answer.reason, Some(UnavailableReason::Booked));
    }

    #[tokio::test]
    async fn pending_bookings_do_not_block_resolution() {
        let (service, _, bookings, _) = service();
        bookings
            .seed(fixture_booking("prop-1", d(2024, 6, 10), d(2024, 6, 12), BookingStatus::Pending))
            .await;

        let answer = service.resolve_on("prop-1", d(2024, 6, 10), today()).await.unwrap();
        assert!(answer.is_available);
    }

    #[tokio::test]
    async fn override_row_values_apply_with_default_fallbacks() {
        let (service, calendar, _, settings) = service();
        settings.seed(fixture_settings("prop-1", 5_000)).await;
        calendar
            .upsert_day(CalendarDay::override_for(
                "prop-1",
                d(2024, 6, 20),
                true,
                Some(12_000),
                Some(3),
                true,
            ))
            .await
            .unwrap();
        // Price left unset on this one: falls back to the default.
        calendar
            .upsert_day(CalendarDay::override_for("prop-1", d(2024, 6, 21), true, None, None, false))
            .await
            .unwrap();

        let first = service.resolve_on("prop-1", d(2024, 6, 20), today()).await.unwrap();
        assert_eq!(first.price_cents, 12_000);
        assert_eq!(first.minimum_stay, 3);
        assert!(first.is_instant_book);

        let second = service.resolve_on("prop-1", d(2024, 6, 21), today()).await.unwrap();
        assert_eq!(second.price_cents, 5_000);
        assert_eq!(second.minimum_stay, 1);
    }

    #[tokio::test]
    async fn empty_calendar_resolves_to_property_defaults() {
        let (service, _, _, settings) = service();
        settings.seed(fixture_settings("prop-1", 5_000)).await;

        let answer = service.resolve_on("prop-1", d(2025, 1, 1), today()).await.unwrap();
        assert!(answer.is_available);
        assert_eq!(answer.price_cents, 5_000);
        assert_eq!(answer.reason, None);
    }

    #[tokio::test]
    async fn unavailable_reasons_reflect_provenance() {
        let (service, calendar, _, _) = service();
        calendar
            .upsert_day(CalendarDay::feed_block("prop-1", d(2024, 6, 20), "feed-1", "Airbnb"))
            .await
            .unwrap();
        calendar
            .upsert_day(CalendarDay::override_for("prop-1", d(2024, 6, 21), false, None, None, false))
            .await
            .unwrap();

        let external = service.resolve_on("prop-1", d(2024, 6, 20), today()).await.unwrap();
        assert_eq!(external.reason, Some(UnavailableReason::ExternalBlocked));

        let host = service.resolve_on("prop-1", d(2024, 6, 21), today()).await.unwrap();
        assert_eq!(host.reason, Some(UnavailableReason::HostBlocked));
    }

    #[tokio::test]
    async fn blocked_ranges_coalesce_consecutive_nights() {
        let (service, calendar, bookings, _) = service();
        bookings
            .seed(fixture_booking("prop-1", d(2024, 6, 3), d(2024, 6, 5), BookingStatus::Confirmed))
            .await;
        calendar
            .upsert_day(CalendarDay::feed_block("prop-1", d(2024, 6, 10), "feed-1", "Airbnb"))
            .await
            .unwrap();

        let ranges = service.blocked_ranges_on("prop-1", today(), 30).await.unwrap();
        assert_eq!(ranges, vec![(d(2024, 6, 3), d(2024, 6, 5)), (d(2024, 6, 10), d(2024, 6, 11))]);
    }

    #[tokio::test]
    async fn export_derives_from_the_resolver() {
        let (service, _, bookings, _) = service();
        bookings
            .seed(fixture_booking("prop-1", d(2024, 6, 3), d(2024, 6, 5), BookingStatus::Confirmed))
            .await;

        let generated_at = DateTime::parse_from_rfc3339("2024-06-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let ics = service
            .export_calendar_on("prop-1", "Sea Cottage", 30, generated_at)
            .await
            .unwrap();

        assert!(ics.contains("DTSTART;VALUE=DATE:20240603"));
        assert!(ics.contains("DTEND;VALUE=DATE:20240605"));
    }
}
