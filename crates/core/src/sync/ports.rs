//! Port interfaces for external feed synchronization.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keystay_domain::{ExternalCalendarFeed, Result};

/// Fetches one external calendar document.
///
/// Implementations must bound the fetch with a timeout and must not retry
/// immediately; the next scheduled tick is the retry policy.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// # Errors
    /// [`keystay_domain::KeystayError::FeedFetch`] on network failure,
    /// timeout, or a non-success HTTP status.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Persistence port for feed subscriptions and their sync status.
#[async_trait]
pub trait FeedRepository: Send + Sync {
    async fn insert(&self, feed: ExternalCalendarFeed) -> Result<()>;

    async fn get(&self, feed_id: &str) -> Result<ExternalCalendarFeed>;

    /// Active feeds for a property, in stored (configuration) order. The
    /// sync cycle processes them in exactly this order.
    async fn list_active(&self, property_id: &str) -> Result<Vec<ExternalCalendarFeed>>;

    async fn delete(&self, feed_id: &str) -> Result<()>;

    /// Step 1 of the sync protocol: status `syncing`, stamp `last_sync_at`.
    async fn mark_syncing(&self, feed_id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Terminal success: status `success`, clear `sync_error`.
    async fn mark_success(&self, feed_id: &str) -> Result<()>;

    /// Terminal failure: status `error`, record the human-readable cause.
    async fn mark_error(&self, feed_id: &str, message: &str) -> Result<()>;
}
