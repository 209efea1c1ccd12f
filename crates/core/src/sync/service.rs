//! Feed sync service - the per-feed synchronization protocol
//!
//! For each active feed of a property: mark syncing, fetch, parse, stamp the
//! source, reconcile into the calendar store, record terminal status. A
//! feed's failure is recorded on that feed alone and never aborts its
//! siblings or the caller's scheduler loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use keystay_domain::constants::FEED_PAUSE_MS;
use keystay_domain::ical::{looks_like_calendar, parse_feed};
use keystay_domain::{CalendarDay, ExternalCalendarFeed, KeystayError, Result};
use tracing::{debug, error, info, instrument, warn};

use super::ports::{FeedFetcher, FeedRepository};
use crate::calendar::ports::CalendarRepository;

/// Outcome of one property's sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySyncReport {
    pub feeds_total: usize,
    pub feeds_failed: usize,
}

/// Feed sync service.
pub struct FeedSyncService {
    feed_repo: Arc<dyn FeedRepository>,
    calendar_repo: Arc<dyn CalendarRepository>,
    fetcher: Arc<dyn FeedFetcher>,
    feed_pause: Duration,
}

impl FeedSyncService {
    pub fn new(
        feed_repo: Arc<dyn FeedRepository>,
        calendar_repo: Arc<dyn CalendarRepository>,
        fetcher: Arc<dyn FeedFetcher>,
    ) -> Self {
        Self { feed_repo, calendar_repo, fetcher, feed_pause: Duration::from_millis(FEED_PAUSE_MS) }
    }

    /// Override the pause between sequential feeds. Tests use zero.
    pub fn with_feed_pause(mut self, pause: Duration) -> Self {
        self.feed_pause = pause;
        self
    }

    /// Synchronize every active feed of one property, sequentially in stored
    /// order, pausing between feeds to avoid bursting outbound requests.
    ///
    /// Feed-level failures are recorded on the feed's status row; only
    /// listing the feeds can fail the cycle itself.
    #[instrument(skip(self))]
    pub async fn sync_property(&self, property_id: &str) -> Result<PropertySyncReport> {
        let feeds = self.feed_repo.list_active(property_id).await?;
        let feeds_total = feeds.len();
        let mut feeds_failed = 0usize;

        for (index, feed) in feeds.iter().enumerate() {
            if index > 0 && !self.feed_pause.is_zero() {
                tokio::time::sleep(self.feed_pause).await;
            }

            if let Err(err) = self.sync_feed(feed).await {
                feeds_failed += 1;
                warn!(feed = %feed.name, feed_id = %feed.id, error = %err, "feed sync failed");
            }
        }

        info!(property_id, feeds_total, feeds_failed, "property sync cycle completed");
        Ok(PropertySyncReport { feeds_total, feeds_failed })
    }

    /// Run the sync protocol for one feed. Returns the number of blocked
    /// nights written on success.
    ///
    /// Any step's failure aborts the remaining steps and is recorded as the
    /// feed's `sync_error`; previously derived blocks stay untouched in that
    /// case (no silent wipe on a failed attempt).
    #[instrument(skip(self, feed), fields(feed_id = %feed.id, source = %feed.name))]
    pub async fn sync_feed(&self, feed: &ExternalCalendarFeed) -> Result<usize> {
        self.feed_repo.mark_syncing(&feed.id, Utc::now()).await?;

        match self.run_protocol(feed).await {
            Ok(nights) => {
                self.feed_repo.mark_success(&feed.id).await?;
                debug!(nights, "feed sync succeeded");
                Ok(nights)
            }
            Err(err) => {
                if let Err(status_err) =
                    self.feed_repo.mark_error(&feed.id, &err.to_string()).await
                {
                    error!(error = %status_err, "failed to record feed sync error");
                }
                Err(err)
            }
        }
    }

    async fn run_protocol(&self, feed: &ExternalCalendarFeed) -> Result<usize> {
        let body = self.fetcher.fetch(&feed.url).await?;

        if !looks_like_calendar(&body) {
            return Err(KeystayError::FeedFormat(format!(
                "document fetched from '{}' does not look like a calendar",
                feed.url
            )));
        }

        let outcome = parse_feed(&body, &feed.property_id)?;

        for skip in &outcome.skipped {
            warn!(
                event = %skip.external_id,
                reason = %skip.reason,
                "skipping malformed feed event"
            );
        }

        // The parser leaves source_name as "pending"; only the caller knows
        // which feed the document came from.
        let mut ranges = outcome.ranges;
        for range in &mut ranges {
            range.source_name = feed.name.clone();
        }

        let mut days: Vec<CalendarDay> = Vec::new();
        for range in &ranges {
            for night in range.nights() {
                days.push(CalendarDay::feed_block(
                    &feed.property_id,
                    night,
                    &feed.id,
                    &range.source_name,
                ));
            }
        }

        // Two events in the same document may block the same night; one row
        // per (property, date) is the invariant.
        days.sort_by_key(|day| day.date);
        days.dedup_by_key(|day| day.date);

        let nights = days.len();
        self.calendar_repo.replace_feed_blocks(&feed.property_id, &feed.id, days).await?;

        Ok(nights)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use keystay_domain::FeedSyncStatus;

    use super::*;
    use crate::calendar::ports::CalendarRepository;
    use crate::testing::{
        fixture_feed, InMemoryCalendarRepository, InMemoryFeedRepository, StaticFetcher,
    };

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ics(ranges: &[(&str, &str)]) -> String {
        let mut doc = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n");
        for (idx, (start, end)) in ranges.iter().enumerate() {
            doc.push_str(&format!(
                "BEGIN:VEVENT\r\nUID:evt-{idx}\r\nDTSTART;VALUE=DATE:{start}\r\nDTEND;VALUE=DATE:{end}\r\nSUMMARY:Reserved\r\nEND:VEVENT\r\n"
            ));
        }
        doc.push_str("END:VCALENDAR\r\n");
        doc
    }

    fn harness(
        fetcher: Arc<StaticFetcher>,
    ) -> (FeedSyncService, Arc<InMemoryFeedRepository>, Arc<InMemoryCalendarRepository>) {
        let feeds = Arc::new(InMemoryFeedRepository::new());
        let calendar = Arc::new(InMemoryCalendarRepository::new());
        let service = FeedSyncService::new(
            Arc::clone(&feeds) as Arc<dyn FeedRepository>,
            Arc::clone(&calendar) as Arc<dyn CalendarRepository>,
            fetcher as Arc<dyn FeedFetcher>,
        )
        .with_feed_pause(Duration::ZERO);
        (service, feeds, calendar)
    }

    #[tokio::test]
    async fn successful_sync_expands_ranges_and_marks_success() {
        let fetcher = Arc::new(StaticFetcher::ok(ics(&[("20240501", "20240504")])));
        let (service, feeds, calendar) = harness(fetcher);

        let feed = fixture_feed("feed-1", "prop-1", "Airbnb");
        feeds.seed(feed.clone()).await;

        let nights = service.sync_feed(&feed).await.unwrap();
        assert_eq!(nights, 3);

        for day in 1..4 {
            let row = calendar.get_day("prop-1", d(2024, 5, day)).await.unwrap().unwrap();
            assert!(!row.is_available);
            assert_eq!(row.source_feed_id.as_deref(), Some("feed-1"));
            assert_eq!(row.notes.as_deref(), Some("Blocked by Airbnb sync"));
        }
        // The checkout day stays untouched.
        assert!(calendar.get_day("prop-1", d(2024, 5, 4)).await.unwrap().is_none());

        let stored = feeds.get("feed-1").await.unwrap();
        assert_eq!(stored.sync_status, FeedSyncStatus::Success);
        assert_eq!(stored.sync_error, None);
        assert!(stored.last_sync_at.is_some());
    }

    #[tokio::test]
    async fn sync_is_idempotent_for_an_unchanged_document() {
        let fetcher = Arc::new(StaticFetcher::ok(ics(&[("20240501", "20240504")])));
        let (service, feeds, calendar) = harness(fetcher);

        let feed = fixture_feed("feed-1", "prop-1", "Airbnb");
        feeds.seed(feed.clone()).await;

        service.sync_feed(&feed).await.unwrap();
        let first = calendar.snapshot().await;

        service.sync_feed(&feed).await.unwrap();
        let second = calendar.snapshot().await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn resync_drops_ranges_no_longer_in_the_document() {
        let fetcher =
            Arc::new(StaticFetcher::ok(ics(&[("20240501", "20240503"), ("20240510", "20240512")])));
        let (service, feeds, calendar) = harness(Arc::clone(&fetcher));

        let feed = fixture_feed("feed-1", "prop-1", "Airbnb");
        feeds.seed(feed.clone()).await;
        service.sync_feed(&feed).await.unwrap();
        assert!(calendar.get_day("prop-1", d(2024, 5, 10)).await.unwrap().is_some());

        // The remote calendar freed the second range.
        fetcher.set_body(ics(&[("20240501", "20240503")])).await;
        service.sync_feed(&feed).await.unwrap();

        assert!(calendar.get_day("prop-1", d(2024, 5, 1)).await.unwrap().is_some());
        assert!(calendar.get_day("prop-1", d(2024, 5, 10)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_failure_records_error_and_keeps_prior_blocks() {
        let fetcher = Arc::new(StaticFetcher::ok(ics(&[("20240501", "20240503")])));
        let (service, feeds, calendar) = harness(Arc::clone(&fetcher));

        let feed = fixture_feed("feed-1", "prop-1", "Airbnb");
        feeds.seed(feed.clone()).await;
        service.sync_feed(&feed).await.unwrap();

        fetcher.set_error("HTTP 500 Internal Server Error").await;
        let err = service.sync_feed(&feed).await.unwrap_err();
        assert!(matches!(err, KeystayError::FeedFetch(_)));

        let stored = feeds.get("feed-1").await.unwrap();
        assert_eq!(stored.sync_status, FeedSyncStatus::Error);
        assert!(stored.sync_error.as_deref().unwrap_or_default().contains("500"));

        // No silent wipe: the previously derived blocks survive.
        assert!(calendar.get_day("prop-1", d(2024, 5, 1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn non_calendar_body_is_a_format_error() {
        let fetcher = Arc::new(StaticFetcher::ok("<html>not a calendar</html>".to_string()));
        let (service, feeds, _) = harness(fetcher);

        let feed = fixture_feed("feed-1", "prop-1", "Airbnb");
        feeds.seed(feed.clone()).await;

        let err = service.sync_feed(&feed).await.unwrap_err();
        assert!(matches!(err, KeystayError::FeedFormat(_)));

        let stored = feeds.get("feed-1").await.unwrap();
        assert_eq!(stored.sync_status, FeedSyncStatus::Error);
    }

    #[tokio::test]
    async fn one_failing_feed_does_not_abort_its_siblings() {
        let fetcher = Arc::new(StaticFetcher::per_url(vec![
            ("https://feeds.test/broken.ics".to_string(), Err("connection refused".to_string())),
            (
                "https://feeds.test/ok.ics".to_string(),
                Ok(ics(&[("20240601", "20240603")])),
            ),
        ]));
        let (service, feeds, calendar) = harness(fetcher);

        let mut broken = fixture_feed("feed-1", "prop-1", "Airbnb");
        broken.url = "https://feeds.test/broken.ics".into();
        let mut healthy = fixture_feed("feed-2", "prop-1", "Vrbo");
        healthy.url = "https://feeds.test/ok.ics".into();
        feeds.seed(broken).await;
        feeds.seed(healthy).await;

        let report = service.sync_property("prop-1").await.unwrap();
        assert_eq!(report, PropertySyncReport { feeds_total: 2, feeds_failed: 1 });

        assert_eq!(feeds.get("feed-1").await.unwrap().sync_status, FeedSyncStatus::Error);
        assert_eq!(feeds.get("feed-2").await.unwrap().sync_status, FeedSyncStatus::Success);
        assert!(calendar.get_day("prop-1", d(2024, 6, 1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn last_synced_feed_wins_a_shared_date() {
        let fetcher = Arc::new(StaticFetcher::per_url(vec![
            (
                "https://feeds.test/a.ics".to_string(),
                Ok(ics(&[("20240601", "20240603")])),
            ),
            (
                "https://feeds.test/b.ics".to_string(),
                Ok(ics(&[("20240602", "20240604")])),
            ),
        ]));
        let (service, feeds, calendar) = harness(fetcher);

        let mut first = fixture_feed("feed-1", "prop-1", "Airbnb");
        first.url = "https://feeds.test/a.ics".into();
        let mut second = fixture_feed("feed-2", "prop-1", "Vrbo");
        second.url = "https://feeds.test/b.ics".into();
        feeds.seed(first).await;
        feeds.seed(second).await;

        service.sync_property("prop-1").await.unwrap();

        // June 2nd is claimed by both; the last-processed feed's write wins.
        let shared = calendar.get_day("prop-1", d(2024, 6, 2)).await.unwrap().unwrap();
        assert_eq!(shared.source_feed_id.as_deref(), Some("feed-2"));
        assert_eq!(shared.notes.as_deref(), Some("Blocked by Vrbo sync"));

        // Dates claimed by only one feed keep that feed's provenance.
        let only_first = calendar.get_day("prop-1", d(2024, 6, 1)).await.unwrap().unwrap();
        assert_eq!(only_first.source_feed_id.as_deref(), Some("feed-1"));
    }

    #[tokio::test]
    async fn skipped_events_do_not_abort_the_document() {
        let doc = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\nUID:bad\r\nDTSTART:garbage\r\nEND:VEVENT\r\n\
            BEGIN:VEVENT\r\nUID:good\r\nDTSTART;VALUE=DATE:20240501\r\nDTEND;VALUE=DATE:20240502\r\nEND:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let fetcher = Arc::new(StaticFetcher::ok(doc.to_string()));
        let (service, feeds, calendar) = harness(fetcher);

        let feed = fixture_feed("feed-1", "prop-1", "Airbnb");
        feeds.seed(feed.clone()).await;

        let nights = service.sync_feed(&feed).await.unwrap();
        assert_eq!(nights, 1);
        assert!(calendar.get_day("prop-1", d(2024, 5, 1)).await.unwrap().is_some());
        assert_eq!(feeds.get("feed-1").await.unwrap().sync_status, FeedSyncStatus::Success);
    }
}
