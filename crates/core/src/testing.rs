//! In-memory port implementations for service tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use keystay_domain::dates::ranges_overlap;
use keystay_domain::{
    Booking, BookingStatus, CalendarDay, ExternalCalendarFeed, FeedSyncStatus, KeystayError,
    PropertySettings, Result,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::booking::ports::BookingRepository;
use crate::calendar::ports::{CalendarRepository, PropertySettingsRepository};
use crate::sync::ports::{FeedFetcher, FeedRepository};

pub fn fixture_booking(
    property_id: &str,
    check_in: NaiveDate,
    check_out: NaiveDate,
    status: BookingStatus,
) -> Booking {
    Booking {
        id: Uuid::now_v7().to_string(),
        property_id: property_id.to_string(),
        check_in,
        check_out,
        status,
        guests: 2,
        total_cents: 50_000,
        payment_ref: None,
        created_at: Utc::now(),
    }
}

pub fn fixture_settings(property_id: &str, price_cents: i64) -> PropertySettings {
    PropertySettings {
        property_id: property_id.to_string(),
        default_price_cents: price_cents,
        default_minimum_stay: 1,
        default_instant_book: false,
        advance_notice_days: 0,
    }
}

pub fn fixture_feed(id: &str, property_id: &str, name: &str) -> ExternalCalendarFeed {
    ExternalCalendarFeed {
        id: id.to_string(),
        property_id: property_id.to_string(),
        name: name.to_string(),
        url: format!("https://feeds.test/{id}.ics"),
        is_active: true,
        sync_status: FeedSyncStatus::Pending,
        sync_error: None,
        last_sync_at: None,
        created_at: Utc::now(),
    }
}

/* ------------------------------------------------------------------------ */
/* Calendar store */
/* ------------------------------------------------------------------------ */

#[derive(Default)]
pub struct InMemoryCalendarRepository {
    days: Mutex<HashMap<(String, NaiveDate), CalendarDay>>,
    fail_upserts_after: Mutex<Option<usize>>,
}

impl InMemoryCalendarRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `allowed` upserts through, then fail every subsequent one.
    pub async fn fail_upserts_after(&self, allowed: usize) {
        *self.fail_upserts_after.lock().await = Some(allowed);
    }

    /// Every stored row, sorted, for whole-store comparisons.
    pub async fn snapshot(&self) -> Vec<CalendarDay> {
        let mut rows: Vec<CalendarDay> = self.days.lock().await.values().cloned().collect();
        rows.sort_by(|a, b| (&a.property_id, a.date).cmp(&(&b.property_id, b.date)));
        rows
    }
}

#[async_trait]
impl CalendarRepository for InMemoryCalendarRepository {
    async fn upsert_day(&self, day: CalendarDay) -> Result<()> {
        let mut remaining = self.fail_upserts_after.lock().await;
        if let Some(allowed) = remaining.as_mut() {
            if *allowed == 0 {
                return Err(KeystayError::Database("injected upsert failure".into()));
            }
            *allowed -= 1;
        }
        drop(remaining);

        self.days.lock().await.insert((day.property_id.clone(), day.date), day);
        Ok(())
    }

    async fn get_day(&self, property_id: &str, date: NaiveDate) -> Result<Option<CalendarDay>> {
        Ok(self.days.lock().await.get(&(property_id.to_string(), date)).cloned())
    }

    async fn list_days_in_range(
        &self,
        property_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CalendarDay>> {
        let mut rows: Vec<CalendarDay> = self
            .days
            .lock()
            .await
            .values()
            .filter(|d| d.property_id == property_id && d.date >= from && d.date < to)
            .cloned()
            .collect();
        rows.sort_by_key(|d| d.date);
        Ok(rows)
    }

    async fn delete_all_days(&self, property_id: &str) -> Result<usize> {
        let mut days = self.days.lock().await;
        let before = days.len();
        days.retain(|(pid, _), _| pid != property_id);
        Ok(before - days.len())
    }

    async fn delete_days_for_booking(
        &self,
        property_id: &str,
        booking_id: &str,
    ) -> Result<usize> {
        let mut days = self.days.lock().await;
        let before = days.len();
        days.retain(|(pid, _), day| {
            pid != property_id || day.booking_id.as_deref() != Some(booking_id)
        });
        Ok(before - days.len())
    }

    async fn replace_feed_blocks(
        &self,
        property_id: &str,
        feed_id: &str,
        new_days: Vec<CalendarDay>,
    ) -> Result<()> {
        let mut days = self.days.lock().await;
        days.retain(|(pid, _), day| {
            pid != property_id || day.source_feed_id.as_deref() != Some(feed_id)
        });
        for day in new_days {
            days.insert((day.property_id.clone(), day.date), day);
        }
        Ok(())
    }
}

/* ------------------------------------------------------------------------ */
/* Booking ledger */
/* ------------------------------------------------------------------------ */

#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: Mutex<Vec<Booking>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, booking: Booking) {
        self.bookings.lock().await.push(booking);
    }

    pub async fn count(&self) -> usize {
        self.bookings.lock().await.len()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn reserve(&self, booking: Booking) -> Result<Booking> {
        let mut bookings = self.bookings.lock().await;

        let conflict = bookings.iter().find(|b| {
            b.property_id == booking.property_id
                && b.status != BookingStatus::Cancelled
                && ranges_overlap(b.check_in, b.check_out, booking.check_in, booking.check_out)
        });

        if let Some(existing) = conflict {
            return Err(KeystayError::DatesUnavailable {
                conflict_start: existing.check_in,
                conflict_end: existing.check_out,
            });
        }

        bookings.push(booking.clone());
        Ok(booking)
    }

    async fn get(&self, booking_id: &str) -> Result<Booking> {
        self.bookings
            .lock()
            .await
            .iter()
            .find(|b| b.id == booking_id)
            .cloned()
            .ok_or_else(|| KeystayError::NotFound(format!("booking {booking_id}")))
    }

    async fn set_status(&self, booking_id: &str, status: BookingStatus) -> Result<()> {
        let mut bookings = self.bookings.lock().await;
        let booking = bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| KeystayError::NotFound(format!("booking {booking_id}")))?;
        booking.status = status;
        Ok(())
    }

    async fn list_confirmed_overlapping(
        &self,
        property_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Booking>> {
        Ok(self
            .bookings
            .lock()
            .await
            .iter()
            .filter(|b| {
                b.property_id == property_id
                    && b.status == BookingStatus::Confirmed
                    && ranges_overlap(b.check_in, b.check_out, from, to)
            })
            .cloned()
            .collect())
    }
}

/* ------------------------------------------------------------------------ */
/* Property settings */
/* ------------------------------------------------------------------------ */

#[derive(Default)]
pub struct InMemorySettingsRepository {
    settings: Mutex<HashMap<String, PropertySettings>>,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, settings: PropertySettings) {
        self.settings.lock().await.insert(settings.property_id.clone(), settings);
    }
}

#[async_trait]
impl PropertySettingsRepository for InMemorySettingsRepository {
    async fn get(&self, property_id: &str) -> Result<Option<PropertySettings>> {
        Ok(self.settings.lock().await.get(property_id).cloned())
    }

    async fn upsert(&self, settings: PropertySettings) -> Result<()> {
        self.settings.lock().await.insert(settings.property_id.clone(), settings);
        Ok(())
    }
}

/* ------------------------------------------------------------------------ */
/* Feed subscriptions */
/* ------------------------------------------------------------------------ */

#[derive(Default)]
pub struct InMemoryFeedRepository {
    feeds: Mutex<Vec<ExternalCalendarFeed>>,
}

impl InMemoryFeedRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, feed: ExternalCalendarFeed) {
        self.feeds.lock().await.push(feed);
    }
}

#[async_trait]
impl FeedRepository for InMemoryFeedRepository {
    async fn insert(&self, feed: ExternalCalendarFeed) -> Result<()> {
        self.feeds.lock().await.push(feed);
        Ok(())
    }

    async fn get(&self, feed_id: &str) -> Result<ExternalCalendarFeed> {
        self.feeds
            .lock()
            .await
            .iter()
            .find(|f| f.id == feed_id)
            .cloned()
            .ok_or_else(|| KeystayError::NotFound(format!("feed {feed_id}")))
    }

    async fn list_active(&self, property_id: &str) -> Result<Vec<ExternalCalendarFeed>> {
        Ok(self
            .feeds
            .lock()
            .await
            .iter()
            .filter(|f| f.property_id == property_id && f.is_active)
            .cloned()
            .collect())
    }

    async fn delete(&self, feed_id: &str) -> Result<()> {
        self.feeds.lock().await.retain(|f| f.id != feed_id);
        Ok(())
    }

    async fn mark_syncing(&self, feed_id: &str, at: DateTime<Utc>) -> Result<()> {
        self.update(feed_id, |feed| {
            feed.sync_status = FeedSyncStatus::Syncing;
            feed.last_sync_at = Some(at);
        })
        .await
    }

    async fn mark_success(&self, feed_id: &str) -> Result<()> {
        self.update(feed_id, |feed| {
            feed.sync_status = FeedSyncStatus::Success;
            feed.sync_error = None;
        })
        .await
    }

    async fn mark_error(&self, feed_id: &str, message: &str) -> Result<()> {
        self.update(feed_id, |feed| {
            feed.sync_status = FeedSyncStatus::Error;
            feed.sync_error = Some(message.to_string());
        })
        .await
    }
}

impl InMemoryFeedRepository {
    async fn update(
        &self,
        feed_id: &str,
        apply: impl FnOnce(&mut ExternalCalendarFeed) + Send,
    ) -> Result<()> {
        let mut feeds = self.feeds.lock().await;
        let feed = feeds
            .iter_mut()
            .find(|f| f.id == feed_id)
            .ok_or_else(|| KeystayError::NotFound(format!("feed {feed_id}")))?;
        apply(feed);
        Ok(())
    }
}

/* ------------------------------------------------------------------------ */
/* Fetcher stubs */
/* ------------------------------------------------------------------------ */

enum FetchStub {
    Single(std::result::Result<String, String>),
    PerUrl(HashMap<String, std::result::Result<String, String>>),
}

/// Fetcher returning canned bodies or errors.
pub struct StaticFetcher {
    stub: Arc<Mutex<FetchStub>>,
}

impl StaticFetcher {
    pub fn ok(body: String) -> Self {
        Self { stub: Arc::new(Mutex::new(FetchStub::Single(Ok(body)))) }
    }

    pub fn per_url(entries: Vec<(String, std::result::Result<String, String>)>) -> Self {
        Self { stub: Arc::new(Mutex::new(FetchStub::PerUrl(entries.into_iter().collect()))) }
    }

    pub async fn set_body(&self, body: String) {
        *self.stub.lock().await = FetchStub::Single(Ok(body));
    }

    pub async fn set_error(&self, message: &str) {
        *self.stub.lock().await = FetchStub::Single(Err(message.to_string()));
    }
}

#[async_trait]
impl FeedFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let stub = self.stub.lock().await;
        let result = match &*stub {
            FetchStub::Single(result) => result.clone(),
            FetchStub::PerUrl(map) => map
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(format!("no stub registered for {url}"))),
        };
        result.map_err(KeystayError::FeedFetch)
    }
}
