//! reqwest-backed implementation of the FeedFetcher port.
//!
//! One bounded GET per call. Deliberately no retry loop here: a failed fetch
//! is recorded on the feed's status row and the next scheduled tick is the
//! retry policy.

use std::time::Duration;

use async_trait::async_trait;
use keystay_core::FeedFetcher;
use keystay_domain::constants::FEED_FETCH_TIMEOUT_SECS;
use keystay_domain::{KeystayError, Result};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::errors::InfraError;

const USER_AGENT: &str = concat!("keystay-engine/", env!("CARGO_PKG_VERSION"));

/// HTTP fetcher for external calendar documents.
#[derive(Clone)]
pub struct HttpFeedFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFeedFetcher {
    /// Start building a fetcher.
    pub fn builder() -> HttpFeedFetcherBuilder {
        HttpFeedFetcherBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url)
            .map_err(|e| KeystayError::FeedFetch(format!("invalid feed url '{url}': {e}")))?;

        let response =
            self.client.get(parsed).send().await.map_err(InfraError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeystayError::FeedFetch(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            )));
        }

        let body = response.text().await.map_err(InfraError::from)?;

        if body.len() > self.max_body_bytes {
            return Err(KeystayError::FeedFetch(format!(
                "feed document exceeds {} bytes",
                self.max_body_bytes
            )));
        }

        debug!(bytes = body.len(), "feed document fetched");
        Ok(body)
    }
}

/// Builder for [`HttpFeedFetcher`].
#[derive(Debug)]
pub struct HttpFeedFetcherBuilder {
    timeout: Duration,
    user_agent: String,
    max_body_bytes: usize,
}

impl Default for HttpFeedFetcherBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(FEED_FETCH_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
            // Calendars are text; anything past this is not a feed.
            max_body_bytes: 4 * 1024 * 1024,
        }
    }
}

impl HttpFeedFetcherBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    pub fn build(self) -> Result<HttpFeedFetcher> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .no_proxy()
            .build()
            .map_err(InfraError::from)?;

        Ok(HttpFeedFetcher { client, max_body_bytes: self.max_body_bytes })
    }
}
